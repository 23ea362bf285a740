use xmldiff_rs::{
    compute_diff, describe, format_diff, parse_str, DiffConfig, Node, OutputFormat, OutputOptions,
    ParseOptions, StopWhenDifferent,
};

fn xml(content: &str) -> Node {
    parse_str(content, &ParseOptions::default()).unwrap()
}

#[test]
fn test_plain_output_lists_locations() {
    let control = xml(r#"<a><b id="1">x</b><c/></a>"#);
    let test = xml(r#"<a><b id="2">y</b><d/></a>"#);
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    let output = format_diff(&diff, &OutputFormat::Plain, &OutputOptions::default()).unwrap();

    assert!(output.contains("• /a[1]/b[1]/@id: attribute value '1' → '2'"));
    assert!(output.contains("• /a[1]/b[1]/text()[1]: text value 'x' → 'y'"));
    assert!(output.contains("- /a[1]/c[1]: child 'c' missing in test"));
    assert!(output.contains("+ /a[1]/d[1]: child 'd' only in test"));
    assert!(output.ends_with("Summary: 4 different"));
}

#[test]
fn test_terminal_output_without_differences() {
    let doc = xml("<a/>");
    let diff = compute_diff(&doc, &doc, &DiffConfig::default());
    let output = format_diff(&diff, &OutputFormat::Terminal, &OutputOptions::default()).unwrap();
    assert!(output.contains("No differences found."));
}

#[test]
fn test_value_truncation() {
    let control = xml(&format!("<a>{}</a>", "x".repeat(200)));
    let test = xml(&format!("<a>{}</a>", "y".repeat(200)));
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    let options = OutputOptions {
        max_value_length: 10,
        ..OutputOptions::default()
    };
    let output = format_diff(&diff, &OutputFormat::Plain, &options).unwrap();
    assert!(output.contains("'xxxxxxx...'"));
    assert!(!output.contains(&"x".repeat(20)));
}

#[test]
fn test_descriptions_and_halt_notice() {
    let control = xml("<a><b>1</b><c>1</c></a>");
    let test = xml("<a><b>2</b><c>2</c></a>");
    let config = DiffConfig::default().with_controller(StopWhenDifferent);
    let diff = compute_diff(&control, &test, &config);
    let options = OutputOptions {
        show_descriptions: true,
        ..OutputOptions::default()
    };
    let output = format_diff(&diff, &OutputFormat::Plain, &options).unwrap();
    assert!(output.contains(&describe(diff.differences()[0].comparison())));
    assert!(output.contains("Expected text value '1' but was '2'"));
    assert!(output.contains("(stopped at first difference)"));
}

#[test]
fn test_json_output_shape() {
    let control = xml("<a><b/></a>");
    let test = xml("<a/>");
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    let output = format_diff(&diff, &OutputFormat::Json, &OutputOptions::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    let differences = value["differences"].as_array().unwrap();
    assert_eq!(differences.len(), 2);
    assert_eq!(differences[0]["type"], "CHILD_NODELIST_LENGTH");
    assert_eq!(differences[1]["type"], "CHILD_LOOKUP");
    assert_eq!(differences[1]["control"]["xpath"], "/a[1]/b[1]");
    assert_eq!(differences[1]["test"]["xpath"], serde_json::Value::Null);
    assert_eq!(differences[1]["test"]["parent_xpath"], "/a[1]");
    assert_eq!(value["identical"], false);
}
