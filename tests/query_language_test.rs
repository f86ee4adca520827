use tabula::query::wildcard::wildcard_match;
use tabula::{
    DataTable, DataValue, FunctionRegistry, HeaderSource, QueryEngine, SearchOutput, SearchStyle,
};

fn table(fields: &[&str], rows: &[&[&str]]) -> DataTable {
    DataTable::new(
        fields.iter().map(|f| f.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|v| DataValue::from(*v)).collect())
            .collect(),
    )
}

#[test]
fn test_grouped_truth_table() {
    // (a in {x, y}) and b != z, over all four combinations
    let data = table(
        &["a", "b"],
        &[
            &["x", "z"], // group true, b is z   -> false
            &["y", "w"], // group true, b not z  -> true
            &["q", "z"], // group false, b is z  -> false
            &["q", "w"], // group false, b not z -> false
        ],
    );
    let engine = QueryEngine::new();
    assert_eq!(
        engine.filter_indices(&data, "(a='x' OR a='y') AND b!='z'"),
        vec![1]
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    let data = table(&["a", "b"], &[&["1", "0"], &["0", "1"], &["0", "0"]]);
    let engine = QueryEngine::new();
    // a='1' OR (a='0' AND b='1')
    assert_eq!(
        engine.filter_indices(&data, "a='1' OR a='0' AND b='1'"),
        vec![0, 1]
    );
    // (a='1' OR a='0') AND b='1'
    assert_eq!(
        engine.filter_indices(&data, "(a='1' OR a='0') AND b='1'"),
        vec![1]
    );
}

#[test]
fn test_deeply_nested_groups() {
    let data = table(&["a", "b", "c"], &[&["1", "2", "3"], &["1", "0", "0"]]);
    let engine = QueryEngine::new();
    assert_eq!(
        engine.filter_indices(&data, "((a='1' AND (b='2' OR (c='9'))) OR (a='7'))"),
        vec![0]
    );
}

#[test]
fn test_age_matches_numbers_loosely() {
    let data = DataTable::new(
        vec!["name".to_string(), "age".to_string()],
        vec![
            vec![DataValue::from("Ann"), DataValue::Integer(30)],
            vec![DataValue::from("Ben"), DataValue::Integer(31)],
            vec![DataValue::from("Cal"), DataValue::Float(3.0)],
        ],
    );
    let result = QueryEngine::new().search(&data, "age='30'");
    assert_eq!(result.indices, vec![0]);
    assert_eq!(result.rows, vec![data.get_row(0).unwrap()]);
}

#[test]
fn test_index_style_example() {
    let data = DataTable::from_matrix(
        vec![
            vec![DataValue::from(1), DataValue::from("a")],
            vec![DataValue::from(2), DataValue::from("b")],
            vec![DataValue::from(3), DataValue::from("c")],
        ],
        HeaderSource::Fields(vec!["id".to_string(), "name".to_string()]),
    );
    assert_eq!(
        data.search("name='b'", SearchStyle::Index),
        SearchOutput::Index(vec![1])
    );
    match data.search("name='b'", SearchStyle::Table) {
        SearchOutput::Table(found) => {
            assert_eq!(found.fields(), data.fields());
            assert_eq!(found.row_count(), 1);
        }
        other => panic!("unexpected output {:?}", other),
    }
}

#[test]
fn test_wildcards() {
    assert!(wildcard_match("Johnson", "%son", false));
    assert!(wildcard_match("Wilson", "%son", false));
    assert!(!wildcard_match("Sonny", "%son", false));
    assert!(wildcard_match("Jan", "J_n", false));
    assert!(wildcard_match("Jon", "J_n", false));
    assert!(!wildcard_match("Jen ", "J_n", false));
}

#[test]
fn test_values_ignore_case_fields_do_not() {
    let data = table(&["Name"], &[&["ALICE"]]);
    let engine = QueryEngine::new();
    assert_eq!(engine.filter_indices(&data, "Name='alice'"), vec![0]);
    assert!(engine.filter_indices(&data, "name='alice'").is_empty());
}

#[test]
fn test_negated_wildcard() {
    let data = table(&["name"], &[&["Johnson"], &["Sonny"]]);
    assert_eq!(
        QueryEngine::new().filter_indices(&data, "name!='%son'"),
        vec![1]
    );
}

#[test]
fn test_macro_expansion_over_every_field() {
    let data = table(
        &["first", "last"],
        &[&["Ann", "Smith"], &["Smith", "Jones"], &["Cal", "Brown"]],
    );
    let engine = QueryEngine::new();
    assert_eq!(engine.filter_indices(&data, "OR*='smith'"), vec![0, 1]);
    assert_eq!(engine.filter_indices(&data, "AND*!='smith'"), vec![2]);
    assert_eq!(
        engine.filter_indices(&data, "OR*='%n%' AND first='Cal'"),
        vec![2]
    );
}

#[test]
fn test_macro_over_no_fields_matches_nothing() {
    let data = DataTable::new(Vec::new(), vec![Vec::new()]);
    assert!(QueryEngine::new().filter_indices(&data, "OR*='x'").is_empty());
}

#[test]
fn test_named_predicates_and_literal_fallback() {
    let data = DataTable::new(
        vec!["n".to_string()],
        vec![
            vec![DataValue::Integer(5)],
            vec![DataValue::Integer(50)],
            vec![DataValue::from("$big()")],
        ],
    );

    let functions = FunctionRegistry::new().with_predicate("big", |cell, _| {
        cell.as_number().is_some_and(|n| n > 10.0)
    });
    let engine = QueryEngine::new().with_functions(functions);
    assert_eq!(engine.filter_indices(&data, "n='$big()'"), vec![1]);

    // Without the predicate the call text is just a pattern
    assert_eq!(QueryEngine::new().filter_indices(&data, "n='$big()'"), vec![2]);
}

#[test]
fn test_predicate_receives_literal_args() {
    let data = table(&["color"], &[&["red"], &["green"], &["blue"]]);
    let engine = QueryEngine::new().with_functions(FunctionRegistry::with_builtins());
    assert_eq!(
        engine.filter_indices(&data, "color='$in(red, blue)'"),
        vec![0, 2]
    );
}

#[test]
fn test_malformed_queries_degrade_to_no_rows() {
    let data = table(&["a"], &[&["1"], &["2"]]);
    let engine = QueryEngine::new();
    for query in ["a=1", "a='1", "(a='1'", "a='1' AND", "a='1' a='2'", "a=='1'"] {
        assert!(
            engine.filter_indices(&data, query).is_empty(),
            "query {:?} should match nothing",
            query
        );
    }
}

#[test]
fn test_substring_field_names_follow_declaration_order() {
    let rows: &[&[&str]] = &[&["Ann", "Lee"]];
    let spoiled = table(&["name", "firstname"], rows);
    assert!(QueryEngine::new()
        .filter_indices(&spoiled, "firstname='Ann'")
        .is_empty());

    let fine = table(&["firstname", "name"], rows);
    assert_eq!(
        QueryEngine::new().filter_indices(&fine, "firstname='Ann'"),
        vec![0]
    );
}

#[test]
fn test_program_describe() {
    let engine = QueryEngine::new();
    let fields = vec!["a".to_string(), "b".to_string()];
    let program = engine.compile("a='1' OR b!='2'", &fields);
    let tree = program.describe();
    assert!(tree.starts_with("OR"));
    assert!(tree.contains("MATCH(a#0"));
    assert!(tree.contains("NOT_MATCH(b#1"));
    assert!(program.matches(&[DataValue::from("1"), DataValue::from("2")]));
    assert!(!program.matches(&[DataValue::from("0"), DataValue::from("2")]));
}

#[test]
fn test_predicate_call_only_needs_to_lead_the_value() {
    let data = DataTable::new(
        vec!["n".to_string()],
        vec![vec![DataValue::Integer(3)], vec![DataValue::Integer(8)]],
    );
    let engine = QueryEngine::new().with_functions(FunctionRegistry::with_builtins());
    assert_eq!(engine.filter_indices(&data, "n='$gt(5) '"), vec![1]);
    assert_eq!(engine.filter_indices(&data, "n='$gt(5)x'"), vec![1]);
}
