use crate::harness::{function, map, render, Fixture};

use compiler::{Deferred, Value};
use futures::future;
use insta::assert_snapshot;
use serde_json::json;

fn resolved(value: impl Into<Value>) -> Value {
    Value::Deferred(Deferred::new(future::ready(Ok(value.into()))))
}

/// `<br>` no matter what it is called with
fn br() -> Value {
    function(|_| Ok(Value::from("<br>")))
}

const JS: &str = "var somejs = 'test';\nvar something = \"el\\\"se\";";
const JSON: &str = "{\"some\": \"json\"}";
const ESCAPED_JS: &str = r#"var somejs = \'test\';\nvar something = \"el\\\"se\";"#;
const ESCAPED_JSON: &str = r#"{\"some\": \"json\"}"#;

#[test]
fn arrays_and_maps() {
    let output = render(concat!(
        "{{fn (a b c d)\n",
        "    {each a \"should not show\" \"should show\"}\n",
        "    {each b \"3x\" \"should not show\"}\n",
        "    {if c.a \"should not show\" \"should show\"}\n",
        "    {d.a}\n",
        "    {d.b}\n",
        "    {d.c}\n",
        "} () (1 2 3) (:) (:a 4 :b 5 :c 6)}",
    ));
    assert_snapshot!(output, @"should show3x3x3xshould show456");
}

#[test]
fn async_view_model() {
    let output = Fixture::new(concat!(
        "{viewmodel::showme}{~n}\n",
        "{if {viewmodel::iftest} \"should show\" \"should not show\"}{~n}\n",
        "{each {viewmodel::eachtest} \"3x\" \"should not show\"}",
    ))
    .view_model(|_| {
        Ok(map([
            ("showme", function(|_| Ok(resolved("should show")))),
            ("iftest", function(|_| Ok(resolved(true)))),
            (
                "eachtest",
                function(|_| Ok(resolved(vec![Value::from("a"), Value::from("b"), Value::from("c")]))),
            ),
        ]))
    })
    .render();
    assert_eq!(output, "should show\nshould show\n3x3x3x");
}

#[test]
fn comments() {
    assert_eq!(render("{* hidden *}\n{{* hidden *}if{* hidden *}}"), "");
}

#[test]
fn compares() {
    let output = render(concat!(
        "{if {< 5 3} \"should not show\" \"should show\"}{~n}\n",
        "{if {> 5 3} \"should show\" \"should not show\"}{~n}\n",
        "{if {>= 5 3} \"should show\" \"should not show\"}{~n}\n",
        "{if {>= 5 5} \"should show\" \"should not show\"}{~n}\n",
        "{if {<= 5 3} \"should not show\" \"should show\"}{~n}\n",
        "{if {<= 5 5} \"should show\" \"should not show\"}{~n}\n",
        "{if {== 5 5} \"should show\" \"should not show\"}{~n}\n",
        "{if {== 5 3} \"should not show\" \"should show\"}{~n}\n",
        "{if {!= 5 3} \"should show\" \"should not show\"}{~n}\n",
        "{if {!= 5 5} \"should not show\" \"should show\"}{~n}\n",
        "{if {not {== 5 3}} \"should show\" \"should not show\"}{~n}\n",
        "{if {and {== 5 5} {> 5 3}} \"should show\" \"should not show\"}{~n}\n",
        "{if {and {== 5 5} {> 5 5}} \"should not show\" \"should show\"}{~n}\n",
        "{if {and {== 5 3} {> 5 3}} \"should not show\" \"should show\"}{~n}\n",
        "{if {and {== 5 3} {> 5 5}} \"should not show\" \"should show\"}{~n}\n",
        "{if {or {== 5 5} {> 5 3}} \"should show\" \"should not show\"}{~n}\n",
        "{if {or {== 5 5} {> 5 5}} \"should show\" \"should not show\"}{~n}\n",
        "{if {or {== 5 3} {> 5 3}} \"should show\" \"should not show\"}{~n}\n",
        "{if {or {== 5 3} {> 5 5}} \"should not show\" \"should show\"}",
    ));
    assert_eq!(output, vec!["should show"; 19].join("\n"));
}

#[test]
fn data() {
    let output = Fixture::new("{data::should} {data::show}")
        .data(map([
            ("should", Value::from("should")),
            ("show", function(|_| Ok(Value::from("show")))),
        ]))
        .render();
    assert_eq!(output, "should show");
}

#[test]
fn def() {
    let output = render(concat!(
        "{def hello \"Hello\"}\n",
        "{hello} World!{~n}\n",
        "\n",
        "{def func {fn\n",
        "  {def hello \"Hola\"}\n",
        "  {def four {+ {* 1 2} {- 87 85}}}\n",
        "  {hello} Mundo! {four}\n",
        "}}\n",
        "{func}",
    ));
    assert_eq!(output, "Hello World!\nHola Mundo! 4");
}

#[test]
fn empty_each() {
    assert_eq!(render("{each () \"should not show\" \"should show\"}"), "should show");
}

#[test]
fn empty() {
    assert_eq!(render(""), "");
    assert_eq!(render("{}"), "");
}

#[test]
fn escape_rules() {
    let output = render(concat!(
        "{{fn (test renderColor renderColors)\n",
        "    <div className=\"colors\">\n",
        "        Hello {test.name}\n",
        "        {renderColors test.colors renderColor}\n",
        "    </div>\n",
        "}\n",
        "    (:name \"Test\" :colors (\"red\" \"green\" \"blue\"))\n",
        "    {fn (color)\n",
        "        <li className=\"color\" style=\"background-color: {color}\">\n",
        "            {color}\n",
        "        </li>\n",
        "    }\n",
        "\n",
        "    {fn (colors renderColor)\n",
        "        {if {isNotEmpty colors} {fn\n",
        "            <ul>{each colors renderColor}</ul>\n",
        "        } {fn\n",
        "            <div>No colors!</div>\n",
        "        }}\n",
        "   }\n",
        "}",
    ));
    assert_eq!(
        output,
        concat!(
            "<div className=\"colors\">Hello Test<ul>",
            "<li className=\"color\" style=\"background-color: red\">red</li>",
            "<li className=\"color\" style=\"background-color: green\">green</li>",
            "<li className=\"color\" style=\"background-color: blue\">blue</li>",
            "</ul></div>",
        )
    );
}

#[test]
fn escaped() {
    let output = Fixture::new(concat!(
        "{data::fn \"hello world\"}{~n}\n",
        "{data::escape}{~n}\n",
        "{escapeJs data::js}{~n}\n",
        "{escapeHtml {escapeJs data::jsWithHtml}}{~n}\n",
        "{escapeHtml {escapeJs {safe data::jsWithHtml}}}{~n}\n",
        "{escapeJson data::json}{~n}\n",
        "{escapeHtml \"\"}{~n}\n",
        "{escapeJs \"\"}{~n}\n",
        "{escapeJson \"\"}{~n}\n",
        "{escapeJs {safe data::js}}{~n}\n",
        "{escapeJson {safe data::json}}",
    ))
    .data(map([
        ("fn", br()),
        ("escape", Value::from("<br>")),
        ("js", Value::from(JS)),
        ("jsWithHtml", Value::from("var somehtml = '<br>';")),
        ("json", Value::from(JSON)),
    ]))
    .render();
    let escaped_html = r"var somehtml = \&#39;&lt;br&gt;\&#39;;";
    let expected = [
        "&lt;br&gt;",
        "&lt;br&gt;",
        ESCAPED_JS,
        escaped_html,
        escaped_html,
        ESCAPED_JSON,
        "",
        "",
        "",
        ESCAPED_JS,
        ESCAPED_JSON,
    ];
    assert_eq!(output, expected.join("\n"));
}

#[test]
fn escapes() {
    assert_eq!(render("{~s}{~n}{~lb}{~r}{~rb}"), " \n{\r}");
}

#[test]
fn false_if() {
    assert_eq!(render("{if false \"should not show\" \"should show\"}"), "should show");
}

#[test]
fn if_expression() {
    let output = Fixture::new(concat!(
        "{each data::accounts {fn (account)\n",
        "<div>\n",
        "    {if {== account.accountStatus \"closed\"} {fn\n",
        "    <div>\n",
        "        Your account has been closed!\n",
        "    </div>\n",
        "    } {if {== account.accountStatus \"suspended\"} {fn\n",
        "    <div>\n",
        "        Your account has been temporarily suspended\n",
        "    </div>\n",
        "    } {fn\n",
        "    <div>\n",
        "        Bank balance:\n",
        "        <span class=\"{if {< account.balance 0} \"negative\" \"positive\"}\">${account.balanceFormatted}</span>\n",
        "    </div>\n",
        "    }}}\n",
        "</div>\n",
        "}}",
    ))
    .data(json!({
        "accounts": [
            {"balance": 0, "balanceFormatted": "$0.00", "status": "open"},
            {"balance": 10, "balanceFormatted": "$10.00", "status": "closed"},
            {"balance": -100, "balanceFormatted": "$-100.00", "status": "suspended"},
            {"balance": 999, "balanceFormatted": "$999.00", "status": "open"}
        ]
    }))
    .render();
    assert_eq!(
        output,
        concat!(
            "<div><div>Bank balance:<span class=\"positive\">$$0.00</span></div></div>",
            "<div><div>Bank balance:<span class=\"positive\">$$10.00</span></div></div>",
            "<div><div>Bank balance:<span class=\"negative\">$$-100.00</span></div></div>",
            "<div><div>Bank balance:<span class=\"positive\">$$999.00</span></div></div>",
        )
    );
}

#[test]
fn immediate_functions() {
    assert_eq!(render("{{fn (show)\nshould {show}\n} \"show\"}"), "should show");
}

#[test]
fn includes() {
    let output = render(concat!(
        "{include \"subcomponents/basic\" (:should \"should\" :show {fn\n",
        "show\n",
        "})}{~n}\n",
        "{include \"subcomponents/plain\"}",
    ));
    assert_eq!(output, "should show\nPlain");
}

#[test]
fn is_empty() {
    let output = render(concat!(
        "{if {isEmpty 0} \"should not show\" \"should show\"}{~n}\n",
        "{if {isEmpty 1} \"should not show\" \"should show\"}{~n}\n",
        "{if {isEmpty 99999} \"should not show\" \"should show\"}{~n}\n",
        "{if {isEmpty ()} \"should show\" \"should not show\"}{~n}\n",
        "{if {isEmpty (1)} \"should not show\" \"should show\"}{~n}\n",
        "{if {isEmpty \"\"} \"should show\" \"should not show\"}{~n}\n",
        "{if {isEmpty \"a\"} \"should not show\" \"should show\"}{~n}\n",
        "{if {isNotEmpty (1)} \"should show\" \"should not show\"}",
    ));
    assert_eq!(output, vec!["should show"; 8].join("\n"));
}

#[test]
fn key_access() {
    let output = Fixture::new(concat!(
        "{data::value.test}{~n}\n",
        "{get data::test}{~n}\n",
        "{get data::value \"test\"}{~n}\n",
        "{get data::value data::key}{~n}\n",
        "{get data::arr 1}{~n}\n",
        "{get data::arr data::index}",
    ))
    .data(json!({
        "test": "Should show",
        "arr": ["Should not show", "Should show"],
        "index": 1,
        "value": {"test": "Should show"},
        "key": "test"
    }))
    .render();
    assert_eq!(output, vec!["Should show"; 6].join("\n"));
}

#[test]
fn literals() {
    let output = render(concat!(
        "{{fn (a b c d e f g)\n",
        "{a}{~s}\n",
        "{b}{~s}\n",
        "{c}{~s}\n",
        "{d}{~s}\n",
        "{e}{~s}\n",
        "{f}{~s}\n",
        "{g}\n",
        "} -1 42 3.14 \"string\" \"\" true false}",
    ));
    assert_snapshot!(output, @"-1 42 3.14 string  true false");
}

#[test]
fn lookups() {
    let output = Fixture::new(concat!(
        "{inviewmodel}{~n}\n",
        "{indata}{~n}\n",
        "{instrings}{~n}\n",
        "\n",
        "{{fn (indata)\n",
        "{inviewmodel}{~n}\n",
        "{indata}{~n}\n",
        "{instrings}\n",
        "} \"something different\"}",
    ))
    .view_model(|_| Ok(map([("inviewmodel", Value::from("should show"))])))
    .strings(json!({"instrings": "should show"}))
    .data(json!({"inviewmodel": "should not show", "indata": "should show"}))
    .render();
    assert_eq!(
        output,
        "should show\nshould show\nshould show\nshould show\nsomething different\nshould show"
    );
}

#[test]
fn maths() {
    assert_snapshot!(
        render("{+ 1 1}{~s}{- 1 1}{~s}{* 5 5}{~s}{/ 42 7}{~s}{% 7 2}{~s}{* {+ 2 3} {- {% 7 2} {/ 4 2}}}"),
        @"2 0 25 6 1 -5"
    );
}

#[test]
fn nested_if() {
    let output = render(concat!(
        "{if false \"should not show\"\n",
        "    {if false \"should not show\"\n",
        "        \"should show\"\n",
        "    }\n",
        "}",
    ));
    assert_eq!(output, "should show");
}

#[test]
fn no_out_each() {
    let output = render(concat!(
        "{each (1 2 3) {} {}}\n",
        "{each (1 2 3)}\n",
        "{each () {}}\n",
        "{each ()}\n",
        "{each}",
    ));
    assert_eq!(output, "");
}

#[test]
fn no_out_if() {
    let output = render(concat!(
        "{if true {} {}}\n",
        "{if true {}}\n",
        "{if true}\n",
        "{if false {} {}}\n",
        "{if false {}}\n",
        "{if false}\n",
        "{if}",
    ));
    assert_eq!(output, "");
}

#[test]
fn nonempty_each() {
    let output = render(concat!(
        "{each (5 4 3 2 1) {fn (v i)\n",
        "{+ i 1}: should show {- v 1} more times\n",
        "} \"should not show\"}",
    ));
    assert_eq!(
        output,
        concat!(
            "1: should show 4 more times",
            "2: should show 3 more times",
            "3: should show 2 more times",
            "4: should show 1 more times",
            "5: should show 0 more times",
        )
    );
}

#[test]
fn pipes() {
    let output = Fixture::new(concat!(
        "{\"hello world\"|{fn (h) {h}}}{~n}\n",
        "{(\"SHOULD SHOW\" \"should not show\" \"Should NOT show\")|data::fn2|data::fn3}{~n}\n",
        "{data::v|data::fn1|data::fn2|data::fn3}{~n}\n",
        "{(:key1 \"SHOULD SHOW\" :key2 \"should not show\")|data::getkey1|data::fn3}{~n}\n",
        "{data::js|escapeJs}",
    ))
    .data(map([
        ("v", Value::from("SHOULD SHOW|should not show|should not show")),
        (
            "fn1",
            function(|args| {
                let parts: Vec<Value> = args[0].to_string().split('|').map(Value::from).collect();
                Ok(Value::from(parts))
            }),
        ),
        ("fn2", function(|args| Ok(args[0].get("0")))),
        ("fn3", function(|args| Ok(Value::from(args[0].to_string().to_lowercase())))),
        ("getkey1", function(|args| Ok(args[0].get("key1")))),
        ("js", Value::from("var js = \"test<br>\";")),
    ]))
    .render();
    assert_eq!(
        output,
        "hello world\nshould show\nshould show\nshould show\nvar js = \\\"test<br>\\\";"
    );
}

#[test]
fn pragma() {
    let output = Fixture::new(concat!(
        "{pragma keepWhitespace true}\n",
        "   this keeps whitespace\n",
        "   {data::test}\n",
        "{pragma keepWhitespace false}\n",
        "{pragma defaultEscape \"escapeJs\"}\n",
        "   no longer keeps whitespace\n",
        "   {data::test}",
    ))
    .data(json!({"test": "var js = 'test <br>';"}))
    .render();
    assert_eq!(
        output,
        concat!(
            "\n",
            "   this keeps whitespace\n",
            "   var js = &#39;test &lt;br&gt;&#39;;\n",
            "no longer keeps whitespacevar js = \\'test <br>\\';",
        )
    );
}

#[test]
fn raw() {
    assert_eq!(render("{`{should show}`}"), "{should show}");
}

#[test]
fn reverse_helper() {
    let output = Fixture::new(concat!(
        "{helper::reverse data::A}\n",
        "{helper::reverse data::B}\n",
        "{helper::reverse data::C}\n",
        "{helper::reverse data::D}\n",
        "{helper::reverse data::E}",
    ))
    .data(json!({"A": "Frank", "B": "Joe", "C": "Tom", "D": "Jane", "E": "Jennifer"}))
    .render();
    assert_snapshot!(output, @"knarFeoJmoTenaJrefinneJ");
}

#[test]
fn simple_1() {
    let output = Fixture::new(concat!(
        "<div class=\"colors\">\n",
        "    Hello {data::name}!\n",
        "\n",
        "    {if {isNotEmpty data::colors} {fn\n",
        "    <ul>\n",
        "        {each data::colors {fn (color)\n",
        "        <li class=\"color\">{color}</li>\n",
        "        }}\n",
        "    </ul>\n",
        "    } {fn\n",
        "    <div>\n",
        "        No colors!\n",
        "    </div>\n",
        "    }}\n",
        "</div>",
    ))
    .data(json!({"name": "Jane Doe", "colors": []}))
    .render();
    assert_eq!(output, "<div class=\"colors\">Hello Jane Doe!<div>No colors!</div></div>");
}

#[test]
fn simple_2() {
    let output = Fixture::new(concat!(
        "<div>\n",
        "    <h1 class='header'>{data::header}</h1>\n",
        "    <h2 class='header2'>{data::header2}</h2>\n",
        "    <h3 class='header3'>{data::header3}</h3>\n",
        "    <h4 class='header4'>{data::header4}</h4>\n",
        "    <h5 class='header5'>{data::header5}</h5>\n",
        "    <h6 class='header6'>{data::header6}</h6>\n",
        "    <ul class='list'>\n",
        "        {each data::list {fn (item)\n",
        "        <li class='item'>{item}</li>\n",
        "        }}\n",
        "    </ul>\n",
        "</div>",
    ))
    .data(json!({
        "header": "Header",
        "header2": "Header2",
        "header3": "Header3",
        "header4": "Header4",
        "header5": "Header5",
        "header6": "Header6",
        "list": ["1000000000", "2", "3", "4", "5", "6", "7", "8", "9", "10"]
    }))
    .render();
    let items: String = ["1000000000", "2", "3", "4", "5", "6", "7", "8", "9", "10"]
        .iter()
        .map(|item| format!("<li class='item'>{}</li>", item))
        .collect();
    let expected = format!(
        concat!(
            "<div><h1 class='header'>Header</h1><h2 class='header2'>Header2</h2>",
            "<h3 class='header3'>Header3</h3><h4 class='header4'>Header4</h4>",
            "<h5 class='header5'>Header5</h5><h6 class='header6'>Header6</h6>",
            "<ul class='list'>{}</ul></div>",
        ),
        items
    );
    assert_eq!(output, expected);
}

#[test]
fn strings() {
    let output = Fixture::new("{strings::greeting}, {strings::missing}!")
        .strings(json!({"greeting": "Hej"}))
        .render();
    assert_eq!(output, "Hej, !");
}

#[test]
fn true_if() {
    assert_eq!(render("{if true \"should show\" \"should now show\"}"), "should show");
}

#[test]
fn ui_components() {
    let colors = [
        "red", "green", "blue", "yellow", "orange", "pink", "black", "white", "beige", "brown", "cyan", "magenta",
    ];
    let output = Fixture::new("<div class=\"my-app\">\n    {include \"subcomponents/ui-components-colors\" data::.}\n</div>")
        .data(json!({"name": "John Doe", "colors": colors}))
        .render();
    let items: String = colors
        .iter()
        .map(|color| format!("<li className=\"color\" style=\"background-color: {0}\">{0}</li>", color))
        .collect();
    assert_eq!(
        output,
        format!(
            "<div class=\"my-app\"><div className=\"colors\">Hello John Doe<ul>{}</ul></div></div>",
            items
        )
    );
}

#[test]
fn undefined_each() {
    let output = render(concat!(
        "{{fn (test)\n",
        "    {each test.key \"should not show\" \"should show\"}\n",
        "} (:otherkey \"value\")}",
    ));
    assert_eq!(output, "should show");
}

#[test]
fn undefined_if() {
    let output = render(concat!(
        "{{fn (test)\n",
        "    {if test.key \"should not show\" \"should show\"}\n",
        "} (:otherkey \"value\")}",
    ));
    assert_eq!(output, "should show");
}

#[test]
fn unescaped() {
    let output = Fixture::new(concat!(
        "{safe {data::fn \"hello world\"}}{~n}\n",
        "{safe data::escape}{~n}\n",
        "{safe data::js}{~n}\n",
        "{safe data::json}{~n}\n",
        "{~n}\n",
        "\n",
        "{safe {{fn\n",
        "  {data::fn \"hello world\"}{~n}\n",
        "  {data::escape}\n",
        "}}}",
    ))
    .data(map([
        ("fn", br()),
        ("escape", Value::from("<br>")),
        ("js", Value::from(JS)),
        ("json", Value::from(JSON)),
    ]))
    .render();
    assert_eq!(output, format!("<br>\n<br>\n{}\n{}\n\n<br>\n<br>", JS, JSON));
}

#[test]
fn view_models() {
    let output = Fixture::new("{viewmodel::should} {viewmodel::show}")
        .view_model(|_| {
            Ok(map([
                ("should", Value::from("should")),
                ("show", function(|_| Ok(Value::from("show")))),
            ]))
        })
        .render();
    assert_eq!(output, "should show");
}
