use std::fs;

use promote_lib::{
    compile::{compile, CompileOptsBuilder, OutputFormat},
    diagnostic::{AggregateResult, Code, DiagnosticKind},
};

include! {concat!(env!("OUT_DIR"), "/tests.rs")}

fn run(file: &str, format: OutputFormat) -> AggregateResult<Vec<u8>> {
    let source = fs::read_to_string(file).unwrap();
    let opts = CompileOptsBuilder::new()
        .output_format(format)
        .build()
        .unwrap();
    compile(&source, &opts)
}

fn print_diagnostics<T>(res: &AggregateResult<T>) {
    for (t, d) in res.diagnostics() {
        match t {
            DiagnosticKind::Rec => println!("Rec: {d:?}"),
            DiagnosticKind::Err => println!("Err: {d:?}"),
        }
    }
}

fn expect_output(file: &str, format: OutputFormat, expected: &str) {
    let res = run(file, format);
    if !res.is_ok() {
        println!("Expected file `{file}` to compile without diagnostics but got:");
        print_diagnostics(&res);
        println!();
    }
    let output = String::from_utf8(res.into_value().unwrap()).unwrap();

    pretty_assertions::assert_str_eq!(
        output,
        expected,
        "The {format} output (left) does not match the expected output (right)",
    );
}

fn output_test(file: &str, expected: &str) {
    expect_output(file, OutputFormat::Summary, expected);
}

fn kernel_test(file: &str, expected: &str) {
    expect_output(file, OutputFormat::Kernel, expected);
}

fn diagnostics_test(file: &str, expected_codes: Vec<Code>, needs_err: bool) {
    let res = run(file, OutputFormat::Summary);
    if needs_err && !res.is_err() {
        panic!("Expected compile to fail, but it didn't!");
    }
    if !needs_err && res.is_err() {
        println!("Expected compile to succeed with only warnings, but it didn't!");
        print_diagnostics(&res);
        panic!("Unexpected errors");
    }

    let found_codes: Vec<Code> = res.diagnostics().map(|(_, d)| *d.code()).collect();
    if expected_codes != found_codes {
        println!(
            "Expected to find these diagnostic codes: {:?}
                              But found: {:?}",
            expected_codes, found_codes
        );
        panic!("Not the same diagnostics");
    }
}

#[test]
fn oversized_tiles_point_at_block_and_filter() {
    let source = "kernel k\nblock 65536 65536\nfilter 1 1\nparam %src : ptr\n";
    let opts = CompileOptsBuilder::new().build().unwrap();
    let res = compile(source, &opts);

    assert!(res.is_err());
    let (kind, diagnostic) = res.diagnostics().next().unwrap();
    assert_eq!(kind, DiagnosticKind::Err);
    assert_eq!(*diagnostic.code(), Code::InvalidLaunchConfig);
    let main = &source[std::ops::Range::from(*diagnostic.main_span())];
    assert!(main.starts_with("block 65536 65536"), "{main:?}");
    let (filter, message) = diagnostic.additional_spans().next().unwrap();
    assert!(source[std::ops::Range::from(*filter)].starts_with("filter 1 1"));
    assert_eq!(message.map(String::as_str), Some("filter declared here"));
}
