use quickcheck::{Arbitrary, Gen};

use rand::seq::SliceRandom;
use rand::Rng;

const WORDS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "item", "title", "name", "$price", "_id", "list2",
];

const TEXT: &[&str] = &[
    "Hello", " ", "world", "<div class=\"x\">", "</div>", "&amp;", "!", ", ", "it's", "a.b",
];

const NAMESPACES: &[&str] = &["data", "viewmodel", "helper", "strings", "ctx"];

const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", ">", "<=", ">=", "and", "or", "not", "eq", "add", "get",
];

const ESCAPES: &[&str] = &["s", "n", "r", "lb", "rb"];

/// Generates random well-formed templates: every one of them should
/// parse and compile.
#[derive(Clone, Debug, Default)]
pub struct TemplateFuzzer {
    /// The template generated so far
    source: String,
    /// Names bound by `fn` params and `def`, innermost scope last
    scopes: Vec<Vec<String>>,
    /// Counter for fresh local names, so `def` never rebinds
    next_local: usize,
    /// How many tags deep we are
    depth: usize,
}

impl Arbitrary for TemplateFuzzer {
    fn arbitrary<G: Gen>(gen: &mut G) -> Self {
        let mut fuzz = TemplateFuzzer::default();
        let len = gen.size().clamp(1, 24);
        let elements = gen.gen_range(1, len + 1);
        fuzz.scopes.push(Vec::new());
        fuzz.gen_block(gen, elements);
        fuzz
    }
}

impl TemplateFuzzer {
    const MAX_DEPTH: usize = 3;

    pub fn source(&self) -> &str {
        &self.source
    }

    fn commit(&mut self, code: &str) {
        self.source.push_str(code);
    }

    fn pick<G: Gen>(gen: &mut G, choices: &[&'static str]) -> &'static str {
        choices.choose(gen).copied().unwrap_or("x")
    }

    fn fresh_local(&mut self) -> String {
        self.next_local += 1;
        format!("v{}", self.next_local)
    }

    fn bound_local<G: Gen>(&self, gen: &mut G) -> Option<String> {
        let bound: Vec<&String> = self.scopes.iter().flatten().collect();
        bound.choose(gen).map(|name| (*name).clone())
    }

    fn gen_block<G: Gen>(&mut self, gen: &mut G, elements: usize) {
        for _ in 0..elements {
            self.gen_element(gen);
        }
    }

    fn gen_element<G: Gen>(&mut self, gen: &mut G) {
        let choices = if self.depth < Self::MAX_DEPTH { 11 } else { 7 };
        match gen.gen_range(0, choices) {
            0 | 1 => {
                let text = Self::pick(gen, TEXT);
                self.commit(text);
            }
            2 => {
                self.commit("\n");
                let indent = gen.gen_range(0, 4);
                self.commit(&"  ".repeat(indent));
            }
            3 => {
                let word = Self::pick(gen, WORDS);
                self.commit(&format!("{{* {} *}}", word));
            }
            4 => {
                let code = Self::pick(gen, ESCAPES);
                self.commit(&format!("{{~{}}}", code));
            }
            5 => {
                let text = Self::pick(gen, TEXT);
                self.commit(&format!("{{`{}`}}", text));
            }
            6 => self.commit("{}"),
            7 => self.gen_def(gen),
            _ => self.gen_tag(gen),
        }
    }

    fn gen_def<G: Gen>(&mut self, gen: &mut G) {
        let name = self.fresh_local();
        self.commit(&format!("{{def {} ", name));
        self.gen_expr(gen);
        self.commit("}");
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(name);
        }
    }

    fn gen_tag<G: Gen>(&mut self, gen: &mut G) {
        self.depth += 1;
        self.commit("{");
        match gen.gen_range(0, 7) {
            0 => self.gen_identifier(gen),
            1 => {
                self.commit("safe ");
                self.gen_expr(gen);
            }
            2 => {
                let op = Self::pick(gen, OPERATORS);
                self.commit(op);
                for _ in 0..2 {
                    self.commit(" ");
                    self.gen_expr(gen);
                }
            }
            3 => {
                self.commit("each ");
                self.gen_namespaced(gen);
                self.commit(" ");
                self.gen_fn(gen, 2);
            }
            4 => {
                self.commit("if ");
                self.gen_expr(gen);
                self.commit(" ");
                self.gen_fn(gen, 0);
                if gen.gen() {
                    self.commit(" ");
                    self.gen_fn(gen, 0);
                }
            }
            5 => {
                self.gen_literal(gen);
                let stages = gen.gen_range(1, 3);
                for _ in 0..stages {
                    self.commit("|");
                    self.commit(Self::pick(gen, &["escapeHtml", "escapeJs", "reverse", "helper::shout"]));
                }
            }
            _ => {
                let name = Self::pick(gen, WORDS);
                self.commit(&format!("include \"{}\" ", name));
                self.gen_map(gen);
            }
        }
        self.commit("}");
        self.depth -= 1;
    }

    fn gen_fn<G: Gen>(&mut self, gen: &mut G, max_params: usize) {
        let count = gen.gen_range(0, max_params + 1);
        let params: Vec<String> = (0..count).map(|_| self.fresh_local()).collect();
        self.commit(&format!("{{fn ({}) ", params.join(" ")));
        self.scopes.push(params);
        self.depth += 1;
        let elements = gen.gen_range(1, 4);
        self.gen_block(gen, elements);
        self.depth -= 1;
        self.scopes.pop();
        self.commit("}");
    }

    fn gen_identifier<G: Gen>(&mut self, gen: &mut G) {
        match self.bound_local(gen) {
            Some(local) if gen.gen() => self.commit(&local),
            _ if gen.gen() => {
                let word = Self::pick(gen, WORDS);
                self.commit(word);
            }
            _ => self.gen_namespaced(gen),
        }
    }

    fn gen_namespaced<G: Gen>(&mut self, gen: &mut G) {
        let namespace = Self::pick(gen, NAMESPACES);
        let word = Self::pick(gen, WORDS);
        self.commit(&format!("{}::{}", namespace, word));
        if gen.gen() {
            let field = Self::pick(gen, WORDS);
            self.commit(&format!(".{}", field));
        }
    }

    fn gen_literal<G: Gen>(&mut self, gen: &mut G) {
        let literal = match gen.gen_range(0, 4) {
            0 => format!("\"{}\"", Self::pick(gen, WORDS)),
            1 => gen.gen_range(-100_i32, 100).to_string(),
            2 => {
                let whole: u32 = gen.gen_range(0, 100);
                let fraction: u32 = gen.gen_range(0, 100);
                format!("{}.{}", whole, fraction)
            }
            _ => Self::pick(gen, &["true", "false"]).to_string(),
        };
        self.commit(&literal);
    }

    fn gen_map<G: Gen>(&mut self, gen: &mut G) {
        let count = gen.gen_range(0, 3);
        let keys: Vec<&str> = WORDS.choose_multiple(gen, count).copied().collect();
        if keys.is_empty() {
            self.commit("(:)");
            return;
        }
        self.commit("(");
        for key in keys {
            self.commit(&format!(":{} ", key));
            self.gen_expr(gen);
            self.commit(" ");
        }
        self.commit(")");
    }

    fn gen_expr<G: Gen>(&mut self, gen: &mut G) {
        let nested = self.depth < Self::MAX_DEPTH;
        match gen.gen_range(0, if nested { 6 } else { 3 }) {
            0 => self.gen_literal(gen),
            1 | 2 => self.gen_identifier(gen),
            3 => {
                self.commit("(");
                let items = gen.gen_range(0, 3);
                for index in 0..items {
                    if index > 0 {
                        self.commit(" ");
                    }
                    self.gen_expr(gen);
                }
                self.commit(")");
            }
            4 => self.gen_map(gen),
            _ => self.gen_tag(gen),
        }
    }
}
