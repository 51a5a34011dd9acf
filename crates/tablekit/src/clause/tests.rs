use super::*;

fn placeholder_count(sql: &str) -> usize {
    sql.matches('?').count()
}

#[test]
fn test_empty_renders_nothing() {
    let wc = WhereClause::new();
    assert!(wc.is_empty());
    assert_eq!(wc.text(), "");
    assert!(wc.question_mark_values().is_empty());
}

#[test]
fn test_nested_parens_and_in_list() {
    let mut wc = WhereClause::new();
    wc.add("(")
        .add("(")
        .add("id = oid")
        .add("or")
        .add_value("v != ?", 10i32)
        .add(")")
        .add("and")
        .add_unpadded_value("x IN (?", 3i32)
        .add_unpadded_value(",?", 2i32)
        .add_unpadded_value(",?", 1i32)
        .add(")")
        .add(")");

    assert_eq!(wc.text(), " WHERE ((id = oid OR v != ?) AND x IN (?,?,?))");
    assert_eq!(
        wc.question_mark_values(),
        vec![Value::Int(10), Value::Int(3), Value::Int(2), Value::Int(1)]
    );
}

#[test]
fn test_connectors_are_case_insensitive() {
    for (and, or) in [("and", "or"), ("AND", "OR"), ("And", "oR")] {
        let mut wc = WhereClause::new();
        wc.add("a = 1").add(and).add("b = 2").add(or).add("c = 3");
        assert_eq!(wc.tokens()[1], Token::And);
        assert_eq!(wc.tokens()[3], Token::Or);
        assert_eq!(wc.text(), " WHERE a = 1 AND b = 2 OR c = 3");
    }
}

#[test]
fn test_unpadded_text_still_dispatches_connectors() {
    let mut wc = WhereClause::new();
    wc.add_unpadded("(").add_unpadded("x = 1").add_unpadded("and");
    assert_eq!(
        wc.tokens(),
        &[
            Token::OpenParen,
            Token::Literal {
                text: "x = 1".into(),
                pad: false
            },
            Token::And
        ]
    );
}

#[test]
fn test_open_paren_pads_after_regular_token() {
    let mut wc = WhereClause::new();
    wc.add("NOT").add("(").add("a = 1").add(")");
    assert_eq!(wc.text(), " WHERE NOT (a = 1)");
}

#[test]
fn test_close_paren_lets_next_token_pad() {
    let mut wc = WhereClause::new();
    wc.add("(").add("a = 1").add(")").add_unpadded("IS TRUE");
    assert_eq!(wc.text(), " WHERE (a = 1) IS TRUE");
}

#[test]
fn test_unpadded_after_unpadded_is_joined() {
    let mut wc = WhereClause::new();
    wc.add_unpadded("a").add_unpadded("b");
    assert_eq!(wc.text(), " WHERE ab");
}

#[test]
fn test_absent_token_is_ignored() {
    let mut wc = WhereClause::new();
    wc.add_token(None).add_token(Token::literal("x = 1")).add_token(None);
    assert_eq!(wc.tokens().len(), 1);
    assert_eq!(wc.text(), " WHERE x = 1");
}

#[test]
fn test_values_align_with_placeholders() {
    let mut wc = WhereClause::new();
    wc.add_value("a = ?", "x".to_string())
        .add("and")
        .add("(")
        .add_value("b > ?", 5i64)
        .add("or")
        .add("b IS NULL")
        .add(")")
        .add("and")
        .add_value("c <> ?", Option::<i32>::None);

    let sql = wc.text();
    let values = wc.question_mark_values();
    assert_eq!(placeholder_count(&sql), values.len());
    assert_eq!(
        values,
        vec![Value::Text("x".into()), Value::BigInt(5), Value::Null]
    );
}

#[test]
fn test_de_null_substitutes_empty() {
    assert!(WhereClause::de_null(None).is_empty());
    assert_eq!(WhereClause::de_null(None).text(), "");

    let mut wc = WhereClause::new();
    wc.add("x = 1");
    assert_eq!(WhereClause::de_null(Some(&wc)).text(), " WHERE x = 1");
}

#[test]
fn test_display_lists_tokens() {
    let mut wc = WhereClause::new();
    wc.add("(").add_value("id = ?", 7i64).add(")");
    assert_eq!(wc.to_string(), "WhereClause[(, id = ?{?:7}, )]");
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Literal,
    UnpaddedLiteral,
    Param,
    UnpaddedParam,
    And,
    Or,
    Open,
    Close,
}

const STEPS: [Step; 8] = [
    Step::Literal,
    Step::UnpaddedLiteral,
    Step::Param,
    Step::UnpaddedParam,
    Step::And,
    Step::Or,
    Step::Open,
    Step::Close,
];

fn apply(wc: &mut WhereClause, step: Step, next_value: &mut i64) {
    match step {
        Step::Literal => {
            wc.add("flag");
        }
        Step::UnpaddedLiteral => {
            wc.add_unpadded(",x");
        }
        Step::Param => {
            wc.add_value("p = ?", *next_value);
            *next_value += 1;
        }
        Step::UnpaddedParam => {
            wc.add_unpadded_value(",?", *next_value);
            *next_value += 1;
        }
        Step::And => {
            wc.add("and");
        }
        Step::Or => {
            wc.add("OR");
        }
        Step::Open => {
            wc.add("(");
        }
        Step::Close => {
            wc.add(")");
        }
    }
}

#[test]
fn test_every_token_mix_keeps_placeholders_aligned() {
    let len = STEPS.len();
    for depth in 1..=4u32 {
        for mut code in 0..len.pow(depth) {
            let mut wc = WhereClause::new();
            let mut steps = Vec::new();
            let mut next_value = 0i64;
            for _ in 0..depth {
                let step = STEPS[code % len];
                code /= len;
                steps.push(step);
                apply(&mut wc, step, &mut next_value);
            }

            let text = wc.text();
            let values = wc.question_mark_values();
            assert_eq!(placeholder_count(&text), values.len(), "{steps:?} -> {text}");
            let expected: Vec<Value> = (0..next_value).map(Value::BigInt).collect();
            assert_eq!(values, expected, "{steps:?}");

            assert!(text.starts_with(" WHERE "), "{steps:?} -> {text}");
            let body = &text[" WHERE ".len()..];
            assert!(!body.starts_with(' '), "{steps:?} -> {text}");
            assert!(!body.contains("  "), "{steps:?} -> {text}");
            assert!(!body.contains("( "), "{steps:?} -> {text}");
            assert!(!body.contains(" )"), "{steps:?} -> {text}");
        }
    }
}
