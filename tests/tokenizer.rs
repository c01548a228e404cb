use std::io::Cursor;

use pull_xml::source::Source;
use pull_xml::{Token, Tokenizer};

use pretty_assertions::assert_eq;

/// Renders every token of the document as one line, stopping behind
/// `EndDocument` or `Error`.
fn events(xml: &str) -> Vec<String> {
    drive(&mut Tokenizer::from_str(xml))
}

fn events_opt(xml: &str, trim: bool, collapse: bool) -> Vec<String> {
    let mut tokenizer = Tokenizer::from_str(xml);
    tokenizer.set_trim(trim);
    tokenizer.set_collapse(collapse);
    drive(&mut tokenizer)
}

fn drive<S: Source>(tokenizer: &mut Tokenizer<S>) -> Vec<String> {
    let mut out = Vec::new();
    for _ in 0..1000 {
        let token = tokenizer.next_token();
        out.push(render(tokenizer, token));
        if matches!(token, Token::EndDocument | Token::Error) {
            return out;
        }
    }
    panic!("tokenizer did not finish");
}

fn render<S: Source>(t: &Tokenizer<S>, token: Token) -> String {
    let string =
        |bytes: Option<&[u8]>| String::from_utf8_lossy(bytes.unwrap_or_default()).into_owned();
    match token {
        Token::Declaration => format!("declaration {}={}", string(t.name()), string(t.value())),
        Token::StartDocument => "start-document".to_string(),
        Token::StartTag => format!("start-tag {}", string(t.name())),
        Token::StartAttributes => "start-attributes".to_string(),
        Token::Attribute => format!("attribute {}={}", string(t.name()), string(t.value())),
        Token::EndAttributes => "end-attributes".to_string(),
        Token::Text => format!("text \"{}\"", string(t.text())),
        Token::EndTag => format!("end-tag {}", string(t.name())),
        Token::EndDocument => "end-document".to_string(),
        Token::Error => string(t.error()),
    }
}

#[test]
fn declaration_and_empty_root() {
    assert_eq!(
        events(r#"<?xml version="1.0"?><r/>"#),
        [
            "declaration version=1.0",
            "start-document",
            "start-tag r",
            "start-attributes",
            "end-attributes",
            "end-tag r",
            "end-document",
        ]
    );
}

#[test]
fn declaration_reports_every_pseudo_attribute() {
    assert_eq!(
        events(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><r/>"#),
        [
            "declaration version=1.0",
            "declaration encoding=UTF-8",
            "declaration standalone=yes",
            "start-document",
            "start-tag r",
            "start-attributes",
            "end-attributes",
            "end-tag r",
            "end-document",
        ]
    );
}

#[test]
fn collapse_folds_whitespace() {
    assert_eq!(
        events("<a>hello   world</a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"hello world\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn newlines_and_tabs_fold_to_spaces() {
    assert_eq!(
        events("<a>one\n\ttwo\r\nthree</a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"one two three\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn xml_space_preserve_disables_policies() {
    assert_eq!(
        events(r#"<a xml:space="preserve">  x  </a>"#),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"  x  \"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn nested_xml_space_default_restores_policies() {
    assert_eq!(
        events(r#"<a xml:space="preserve"> x <b xml:space="default"> y </b> z </a>"#),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "start-tag b",
            "start-attributes",
            "end-attributes",
            "text \"y\"",
            "end-tag b",
            "text \" x  z \"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn xml_space_scope_survives_siblings() {
    assert_eq!(
        events(r#"<a xml:space="preserve"><b xml:space="preserve"> x </b><c> y </c></a>"#),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "start-tag b",
            "start-attributes",
            "end-attributes",
            "text \" x \"",
            "end-tag b",
            "start-tag c",
            "start-attributes",
            "end-attributes",
            "text \" y \"",
            "end-tag c",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn cdata_joins_surrounding_text() {
    assert_eq!(
        events("<a>USA <![CDATA[(USA)]]></a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"USA (USA)\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn cdata_content_is_literal() {
    assert_eq!(
        events("<a><![CDATA[ <not> &amp; markup]]></a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \" <not> &amp; markup\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn valueless_attribute_reads_as_one() {
    assert_eq!(
        events("<a b='1' c></a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "attribute b=1",
            "attribute c=1",
            "end-attributes",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn end_tag_names_are_not_verified() {
    assert_eq!(
        events("<a><b></c></a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "start-tag b",
            "start-attributes",
            "end-attributes",
            "end-tag c",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn unterminated_tag_reports_eof() {
    assert_eq!(
        events("<a"),
        ["start-document", "Error: Unexpected end of file."]
    );
}

#[test]
fn eof_inside_attribute_value() {
    assert_eq!(
        events("<a b=\"x"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "Error: Unexpected end of file.",
        ]
    );
}

#[test]
fn bom_is_skipped() {
    let mut tokenizer = Tokenizer::from_slice(b"\xEF\xBB\xBF<r/>");
    assert_eq!(
        drive(&mut tokenizer),
        [
            "start-document",
            "start-tag r",
            "start-attributes",
            "end-attributes",
            "end-tag r",
            "end-document",
        ]
    );
}

#[test]
fn named_references_resolve() {
    assert_eq!(
        events("<a>&amp;&lt;&gt;&quot;&apos;</a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"&<>\"'\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn numeric_references_resolve() {
    assert_eq!(
        events("<a>A-&#66;-&#x43;</a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"A-B-C\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn decoded_newline_survives_without_policies() {
    assert_eq!(
        events_opt("<a>&#x0a;</a>", false, false),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"\n\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn decoded_whitespace_is_still_trimmed() {
    // the reference resolves to '\n', which the trailing trim then removes
    assert_eq!(
        events("<a>&#x0a;</a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn unknown_reference_is_an_error() {
    assert_eq!(
        events("<a>&bogus;</a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "Error(1,11): Unexpected sign.",
        ]
    );
}

#[test]
fn references_resolve_inside_attribute_values() {
    assert_eq!(
        events("<a b=\"x&lt;y\" c='4&#x32;'/>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "attribute b=x<y",
            "attribute c=42",
            "end-attributes",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn comments_and_doctype_in_prolog_are_discarded() {
    assert_eq!(
        events("<!-- intro --> <!DOCTYPE catalog [ <!ELEMENT book (#PCDATA)> ]> <r/>"),
        [
            "start-document",
            "start-tag r",
            "start-attributes",
            "end-attributes",
            "end-tag r",
            "end-document",
        ]
    );
}

#[test]
fn comment_inside_content_is_discarded() {
    assert_eq!(
        events("<a>x <!-- note --> y</a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"x y\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn bytes_above_ascii_pass_through() {
    assert_eq!(
        events("<häx ü=\"ö\"/>"),
        [
            "start-document",
            "start-tag häx",
            "start-attributes",
            "attribute ü=ö",
            "end-attributes",
            "end-tag häx",
            "end-document",
        ]
    );
}

#[test]
fn leading_digit_in_names_is_accepted() {
    assert_eq!(
        events("<1st/>"),
        [
            "start-document",
            "start-tag 1st",
            "start-attributes",
            "end-attributes",
            "end-tag 1st",
            "end-document",
        ]
    );
}

#[test]
fn trim_disabled_keeps_whitespace() {
    assert_eq!(
        events_opt("<a> x </a>", false, true),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \" x \"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn collapse_disabled_keeps_newlines() {
    assert_eq!(
        events_opt("<a>a\nb</a>", true, false),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "text \"a\nb\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn whitespace_only_text_is_suppressed() {
    assert_eq!(
        events("<a>   </a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn padding_around_attributes_and_end_tags() {
    assert_eq!(
        events("<a  b = \"1\"  ></a >"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "attribute b=1",
            "end-attributes",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn text_gathers_around_child_elements() {
    // character data before a child element is kept on the stack and
    // reported together with the data following it
    assert_eq!(
        events("<a>foo<b>bar</b>baz</a>"),
        [
            "start-document",
            "start-tag a",
            "start-attributes",
            "end-attributes",
            "start-tag b",
            "start-attributes",
            "end-attributes",
            "text \"bar\"",
            "end-tag b",
            "text \"foobaz\"",
            "end-tag a",
            "end-document",
        ]
    );
}

#[test]
fn error_reports_row_and_column() {
    assert_eq!(
        events("<a><<x").last().unwrap(),
        "Error(1,5): Unexpected sign."
    );
    assert_eq!(
        events("<a>\n<<x").last().unwrap(),
        "Error(2,3): Unexpected sign."
    );
}

#[test]
fn cdata_outside_an_element_is_an_error() {
    assert_eq!(
        events("<![CDATA[x]]>"),
        ["start-document", "Error(1,3): Unexpected sign."]
    );
}

#[test]
fn error_state_is_sticky_with_identical_text() {
    let mut tokenizer = Tokenizer::from_str("<a><<x");
    while tokenizer.next_token() != Token::Error {}
    let first = tokenizer.error().unwrap().to_vec();
    assert_eq!(first, b"Error(1,5): Unexpected sign.");

    assert_eq!(tokenizer.next_token(), Token::Error);
    assert_eq!(tokenizer.error(), Some(&first[..]));
    assert_eq!(tokenizer.next_token(), Token::Error);
    assert_eq!(tokenizer.error(), Some(&first[..]));
    assert_eq!(tokenizer.name(), None);
}

#[test]
fn end_document_is_sticky() {
    let mut tokenizer = Tokenizer::from_str("<r/>");
    while tokenizer.next_token() != Token::EndDocument {}
    assert_eq!(tokenizer.next_token(), Token::EndDocument);
    assert_eq!(tokenizer.next_token(), Token::EndDocument);
    assert_eq!(tokenizer.name(), None);
    assert_eq!(tokenizer.text(), None);
}

#[test]
fn input_behind_the_root_element_is_never_read() {
    // the scan stops at the root end tag, so trailing garbage is fine
    assert_eq!(
        events("<r/>this is <not> xml").last().unwrap(),
        "end-document"
    );
}

#[test]
fn accessors_follow_the_last_token() {
    let mut t = Tokenizer::from_str("<?xml version=\"1.0\"?><a b=\"2\">t</a>");

    assert_eq!(t.next_token(), Token::Declaration);
    assert_eq!(t.name(), Some(&b"version"[..]));
    assert_eq!(t.value(), Some(&b"1.0"[..]));
    assert_eq!(t.text(), None);
    assert_eq!(t.error(), None);

    assert_eq!(t.next_token(), Token::StartDocument);
    assert_eq!(t.name(), None);
    assert_eq!(t.value(), None);

    assert_eq!(t.next_token(), Token::StartTag);
    assert_eq!(t.name(), Some(&b"a"[..]));
    assert_eq!(t.value(), None);

    assert_eq!(t.next_token(), Token::StartAttributes);
    assert_eq!(t.name(), None);

    assert_eq!(t.next_token(), Token::Attribute);
    assert_eq!(t.name(), Some(&b"b"[..]));
    assert_eq!(t.value(), Some(&b"2"[..]));

    assert_eq!(t.next_token(), Token::EndAttributes);
    assert_eq!(t.name(), None);

    assert_eq!(t.next_token(), Token::Text);
    assert_eq!(t.text(), Some(&b"t"[..]));
    assert_eq!(t.name(), None);

    assert_eq!(t.next_token(), Token::EndTag);
    assert_eq!(t.name(), Some(&b"a"[..]));
    assert_eq!(t.text(), None);

    assert_eq!(t.next_token(), Token::EndDocument);
    assert_eq!(t.name(), None);
}

#[test]
fn policy_flags_report_their_state() {
    let mut tokenizer = Tokenizer::from_str("<r/>");
    assert!(tokenizer.trim());
    assert!(tokenizer.collapse());
    tokenizer.set_trim(false);
    tokenizer.set_trim(false);
    tokenizer.set_collapse(false);
    assert!(!tokenizer.trim());
    assert!(!tokenizer.collapse());
    tokenizer.set_trim(true);
    assert!(tokenizer.trim());
}

#[test]
fn retokenizing_yields_the_same_events() {
    let xml = r#"<?xml version="1.0"?><a b="1">x<c d='2'/>y <![CDATA[z]]></a>"#;
    assert_eq!(events(xml), events(xml));
}

#[test]
fn buffered_reader_matches_slice_input() {
    let xml = r#"<?xml version="1.0"?><r a="1">text</r>"#;
    let mut from_reader = Tokenizer::from_reader(Cursor::new(xml.as_bytes().to_vec()));
    assert_eq!(drive(&mut from_reader), events(xml));
}
