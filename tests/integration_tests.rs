use ebnf_fuzz::lexer::Lexer;
use ebnf_fuzz::special::TableProvider;
use ebnf_fuzz::token::TokenBuffer;
use ebnf_fuzz::{
    FuzzyGenerator, FuzzyGeneratorBuilder, GeneratorConfig, GrammarError, Position,
    SpecialSequenceProvider, Syntax, SyntaxErrorKind,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn generate(grammar: &str) -> Vec<String> {
    let syntax = ebnf_fuzz::parse_str(grammar).unwrap();
    let mut strings = FuzzyGenerator::new().generate(&syntax).unwrap();
    strings.sort();
    strings
}

fn sorted(strings: &[&str]) -> Vec<String> {
    let mut strings: Vec<String> = strings.iter().map(|s| s.to_string()).collect();
    strings.sort();
    strings
}

fn three_digit_numbers() -> Vec<String> {
    (0..1000).map(|n| format!("{:03}", n)).collect()
}

const DIGIT: &str = "digit = '0' | '1' | '2' | '3' | '4' | '5' | '6' | '7' | '8' | '9' ;";

#[test]
fn test_empty_syntax() {
    assert!(generate("syntax = ;").is_empty());
}

#[test]
fn test_single_terminal() {
    assert_eq!(generate("syntax = 'abc' ;"), vec!["abc"]);
}

#[test]
fn test_repeated_single_terminal() {
    assert_eq!(generate("syntax = 3 * 'abc' ;"), vec!["abcabcabc"]);
    assert_eq!(
        generate("syntax = 3 * rule ;\nrule = 'abc' ;"),
        vec!["abcabcabc"]
    );
}

#[test]
fn test_nested_rule() {
    assert_eq!(generate("syntax = rule ;\nrule = 'abc' ;"), vec!["abc"]);
}

#[test]
fn test_branches() {
    assert_eq!(generate("syntax = 'abc' | 'def' ;"), sorted(&["abc", "def"]));
}

#[test]
fn test_grouped_terminals() {
    let expected = sorted(&["abd", "acd"]);

    assert_eq!(generate("syntax = 'a', ('b' | 'c'), 'd' ;"), expected);
    assert_eq!(
        generate("syntax = 'a', rule, 'd' ;\nrule = ('b' | 'c') ;"),
        expected
    );
}

#[test]
fn test_optional_terminals() {
    let expected = sorted(&["ad", "abd", "acd"]);

    assert_eq!(generate("syntax = 'a', ['b' | 'c'], 'd' ;"), expected);
    assert_eq!(generate("syntax = 'a', (/ 'b' | 'c' /), 'd' ;"), expected);
    assert_eq!(
        generate("syntax = 'a', rule, 'd' ;\nrule = ['b' | 'c'] ;"),
        expected
    );
}

#[test]
fn test_repeated_sequence() {
    let expected = sorted(&["ad", "abd", "acd", "abbd", "abcd", "acbd", "accd"]);

    assert_eq!(generate("syntax = 'a', {'b' | 'c'}, 'd' ;"), expected);
    assert_eq!(generate("syntax = 'a', (: 'b' | 'c' :), 'd' ;"), expected);
    assert_eq!(
        generate("syntax = 'a', rule, 'd' ;\nrule = {'b' | 'c'} ;"),
        expected
    );
}

#[test]
fn test_nested_rule_with_exceptions() {
    let grammar = "syntax = rule - 'abc' ;\nrule = ('abc' | 'def' | 'ghi') - 'ghi', 'jkl' ;";
    assert_eq!(generate(grammar), sorted(&["abcjkl", "defjkl"]));
}

#[test]
fn test_same_rule_three_times() {
    let grammar = format!("syntax = digit, digit, digit ;\n{}", DIGIT);
    assert_eq!(generate(&grammar), three_digit_numbers());
}

#[test]
fn test_same_rule_using_repetition() {
    let grammar = format!("syntax = 3 * digit ;\n{}", DIGIT);
    assert_eq!(generate(&grammar), three_digit_numbers());
}

#[test]
fn test_three_identical_groups() {
    let group = "('0' | '1' | '2' | '3' | '4' | '5' | '6' | '7' | '8' | '9')";
    let grammar = format!("syntax = {0},\n         {0},\n         {0};", group);
    assert_eq!(generate(&grammar), three_digit_numbers());
}

#[test]
fn test_rules_with_different_branch_counts() {
    let letters = "letter = 'A' | 'B' | 'C' | 'D' ;";

    let mut expected: Vec<String> = ['A', 'B', 'C', 'D']
        .iter()
        .flat_map(|c| (0..10).map(move |d| format!("{}{}", c, d)))
        .collect();
    expected.sort();
    let grammar = format!("syntax = letter, digit ;\n{}\n{}", DIGIT, letters);
    assert_eq!(generate(&grammar), expected);

    let mut expected: Vec<String> = (0..10)
        .flat_map(|d| ['A', 'B', 'C', 'D'].into_iter().map(move |c| format!("{}{}", d, c)))
        .collect();
    expected.sort();
    let grammar = format!("syntax = digit, letter ;\n{}\n{}", DIGIT, letters);
    assert_eq!(generate(&grammar), expected);
}

#[derive(Debug)]
struct DigitProvider;

impl SpecialSequenceProvider for DigitProvider {
    fn name(&self) -> &str {
        "digits"
    }

    fn is_valid(&self, text: &str) -> bool {
        text == " digit "
    }

    fn generate(&self, _text: &str) -> Vec<String> {
        (0..10).map(|d| d.to_string()).collect()
    }
}

#[test]
fn test_special_sequence() {
    let syntax = ebnf_fuzz::parse_str("syntax = ? digit ? ;").unwrap();
    let generator = FuzzyGeneratorBuilder::new()
        .providers(Default::default())
        .provider(DigitProvider)
        .build();

    let mut strings = generator.generate(&syntax).unwrap();
    strings.sort();
    assert_eq!(strings, (0..10).map(|d| d.to_string()).collect::<Vec<_>>());
}

#[test]
fn test_first_registered_provider_wins() {
    let syntax = ebnf_fuzz::parse_str("syntax = ? digit ? ;").unwrap();
    let generator = FuzzyGeneratorBuilder::new()
        .providers(Default::default())
        .provider(TableProvider::new().insert("digit", &["x"]))
        .provider(DigitProvider)
        .build();

    assert_eq!(generator.generate(&syntax).unwrap(), vec!["x"]);
}

#[test]
fn test_undefined_rule() {
    let syntax = ebnf_fuzz::parse_str("syntax = 'a', missing ;").unwrap();
    let err = FuzzyGenerator::new().generate(&syntax).unwrap_err();

    match err {
        GrammarError::UndefinedRule { name, position } => {
            assert_eq!(name, "missing");
            assert_eq!(position, Position::new(1, 15, 14));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_redefinition() {
    let err = ebnf_fuzz::parse_str("syntax = rule ;\nrule = 'a' ;\nrule = 'b' ;").unwrap_err();

    match err {
        GrammarError::Syntax(err) => {
            assert_eq!(err.kind, SyntaxErrorKind::Redefined("rule".to_string()));
            assert_eq!(err.position.line, 3);
            assert_eq!(err.position.column, 1);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_errors_are_distinct_kinds() {
    let parse_err = ebnf_fuzz::parse_str("syntax = 'a' - rule ;").unwrap_err();
    assert!(matches!(parse_err, GrammarError::Syntax(_)));
    assert!(parse_err.to_string().contains("referenced in exception"));

    let syntax = ebnf_fuzz::parse_str("syntax = rule ;").unwrap();
    let generate_err = FuzzyGenerator::new().generate(&syntax).unwrap_err();
    assert!(matches!(generate_err, GrammarError::UndefinedRule { .. }));
}

#[test]
fn test_parse_from_token_stream() {
    let mut tokens = TokenBuffer::new(Lexer::tokenize("syntax = 'x' | 'y' .").unwrap());
    let syntax = ebnf_fuzz::parse(&mut tokens).unwrap();

    assert_eq!(syntax.len(), 1);
    assert_eq!(
        FuzzyGenerator::new().generate(&syntax).unwrap(),
        vec!["x", "y"]
    );
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "(* A small grammar *)\nsyntax = greeting, ' ', subject ;\ngreeting = 'Hello' ;\nsubject = 'world' | 'Rust' ;"
    )
    .unwrap();

    let syntax = Syntax::from_file(file.path()).unwrap();
    assert_eq!(syntax.len(), 3);

    let mut strings = FuzzyGenerator::new().generate(&syntax).unwrap();
    strings.sort();
    assert_eq!(strings, vec!["Hello Rust", "Hello world"]);
}

#[test]
fn test_missing_file() {
    let err = Syntax::from_file("does/not/exist.ebnf").unwrap_err();
    assert!(matches!(err, GrammarError::Io(_)));
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "start_rule": "number", "max_repetitions": 1, "special_sequences": {{ "sign": ["-"] }} }}"#
    )
    .unwrap();

    let config = GeneratorConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.start_rule, "number");

    let syntax = ebnf_fuzz::parse_str("number = [? sign ?], {'1'} ;").unwrap();
    let mut strings = FuzzyGenerator::with_config(config).generate(&syntax).unwrap();
    strings.sort();
    assert_eq!(strings, sorted(&["", "1", "-", "-1"]));
}

#[test]
fn test_built_in_providers() {
    let strings = generate("syntax = ? digit ? - '0', ? a..c ? ;");
    assert_eq!(strings.len(), 27);
    assert!(strings.contains(&"9c".to_string()));
    assert!(!strings.iter().any(|s| s.starts_with('0')));
}

#[test]
fn test_deeply_nested_grammar_is_rejected() {
    let depth = 100_000;
    let grammar = format!("syntax = {}'a'{} ;", "(".repeat(depth), ")".repeat(depth));

    let err = ebnf_fuzz::parse_str(&grammar).unwrap_err();
    match err {
        GrammarError::Syntax(err) => {
            assert!(matches!(err.kind, SyntaxErrorKind::NestingTooDeep(_)));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_large_repetition_count_of_empty_set() {
    let syntax = ebnf_fuzz::parse_str("syntax = 4000000000 * ('a' - 'a') ;").unwrap();
    let generator = FuzzyGeneratorBuilder::new().max_output(10).build();

    assert!(generator.generate(&syntax).unwrap().is_empty());
}
