//! End to end tests: templates go through an `Engine` exactly as a host
//! would drive them.

#[cfg(test)]
mod harness;

#[cfg(test)]
mod corpus;

#[cfg(test)]
mod host;
