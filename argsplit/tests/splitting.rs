//! End-to-end splitting scenarios driven purely through argsplit's public
//! API, plus its core invariants stated as concrete examples.

use std::path::PathBuf;

use argsplit::{
    FlagOpt, RepeatableOpt, RequiredOpt, Schema, SchemaBuilder, SingleOpt, Splitter,
    SplittingError, VarargsOpt,
};

#[derive(Debug, PartialEq, Eq)]
struct CreateCommand {
    create: bool,
    file: Option<String>,
    files: Vec<String>,
}

fn jar_like_schema() -> Schema<CreateCommand> {
    SchemaBuilder::new()
        .option(FlagOpt::new(["-c", "--create"]).unwrap())
        .option(SingleOpt::new(["-f", "--file"]).unwrap())
        .option(VarargsOpt::new(["files"]).unwrap())
        .finalize(|mut values| {
            let mut values = values.drain(..);
            Ok(CreateCommand {
                create: *values.next().unwrap().downcast::<bool>().unwrap(),
                file: *values.next().unwrap().downcast::<Option<String>>().unwrap(),
                files: *values.next().unwrap().downcast::<Vec<String>>().unwrap(),
            })
        })
        .unwrap()
}

#[test]
fn flag_key_value_and_varargs() {
    let result = Splitter::from_schema(jar_like_schema())
        .split(["--create", "--file", "classes.jar", "Foo.class", "Bar.class"])
        .unwrap();
    assert_eq!(
        result,
        CreateCommand {
            create: true,
            file: Some("classes.jar".to_owned()),
            files: vec!["Foo.class".to_owned(), "Bar.class".to_owned()],
        }
    );
}

#[test]
fn attached_value_equals_two_token_form() {
    let a = Splitter::from_schema(jar_like_schema())
        .split(["--create", "--file", "classes.jar", "Foo.class", "Bar.class"])
        .unwrap();
    let b = Splitter::from_schema(jar_like_schema())
        .split(["--create", "--file=classes.jar", "Foo.class", "Bar.class"])
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn clustered_flags_equal_separated_flags() {
    fn schema() -> Schema<(bool, bool, bool)> {
        SchemaBuilder::new()
            .option(FlagOpt::new(["-f"]).unwrap())
            .option(FlagOpt::new(["-h"]).unwrap())
            .option(FlagOpt::new(["-z"]).unwrap())
            .finalize(|mut values| {
                let mut values = values.drain(..);
                Ok((
                    *values.next().unwrap().downcast::<bool>().unwrap(),
                    *values.next().unwrap().downcast::<bool>().unwrap(),
                    *values.next().unwrap().downcast::<bool>().unwrap(),
                ))
            })
            .unwrap()
    }

    let clustered = Splitter::from_schema(schema()).split(["-zfh"]).unwrap();
    let separated = Splitter::from_schema(schema()).split(["-z", "-f", "-h"]).unwrap();
    assert_eq!(clustered, (true, true, true));
    assert_eq!(clustered, separated);
}

#[test]
fn non_flag_cluster_falls_through_to_positional() {
    // "-ab" looks cluster-shaped but "b" is not a registered flag, so the
    // whole token must fall through and be rejected as unhandled (there is
    // no varargs to absorb it).
    let schema: Schema<bool> = SchemaBuilder::new()
        .option(FlagOpt::new(["-a"]).unwrap())
        .finalize(|mut values| Ok(*values.remove(0).downcast::<bool>().unwrap()))
        .unwrap();
    let err = Splitter::from_schema(schema).split(["-ab"]).unwrap_err();
    assert!(matches!(err, SplittingError::UnhandledArguments { .. }));
}

#[test]
fn repeatable_merges_across_occurrences_and_comma_form() {
    let schema: Schema<Vec<String>> = SchemaBuilder::new()
        .option(RepeatableOpt::new(["--policies"]).unwrap())
        .finalize(|mut values| Ok(*values.remove(0).downcast::<Vec<String>>().unwrap()))
        .unwrap();
    let result = Splitter::from_schema(schema)
        .split(["--policies", "RUNTIME", "--policies=SOURCE,CLASS"])
        .unwrap();
    assert_eq!(result, vec!["RUNTIME", "SOURCE", "CLASS"]);
}

#[test]
fn repeatable_two_token_and_comma_forms_are_equivalent() {
    fn schema() -> Schema<Vec<String>> {
        SchemaBuilder::new()
            .option(RepeatableOpt::new(["--p"]).unwrap())
            .finalize(|mut values| Ok(*values.remove(0).downcast::<Vec<String>>().unwrap()))
            .unwrap()
    }
    let two_token = Splitter::from_schema(schema())
        .split(["--p", "v1", "--p", "v2"])
        .unwrap();
    let attached = Splitter::from_schema(schema())
        .split(["--p=v1,v2"])
        .unwrap();
    assert_eq!(two_token, attached);
}

#[derive(Debug, PartialEq, Eq)]
struct ChangeDir {
    dir: String,
    file: String,
}

#[test]
fn nested_single_schema() {
    let nested = SchemaBuilder::new()
        .option(RequiredOpt::new(["dir"]).unwrap())
        .option(RequiredOpt::new(["file"]).unwrap())
        .finalize(|mut values| {
            let mut values = values.drain(..);
            Ok(ChangeDir {
                dir: *values.next().unwrap().downcast::<String>().unwrap(),
                file: *values.next().unwrap().downcast::<String>().unwrap(),
            })
        })
        .unwrap();
    let outer: Schema<Option<ChangeDir>> = SchemaBuilder::new()
        .option(SingleOpt::new(["-C"]).unwrap().nested_schema(nested).unwrap())
        .finalize(|mut values| Ok(*values.remove(0).downcast::<Option<ChangeDir>>().unwrap()))
        .unwrap();
    let result = Splitter::from_schema(outer).split(["-C", "foo/", "."]).unwrap();
    assert_eq!(
        result,
        Some(ChangeDir {
            dir: "foo/".to_owned(),
            file: ".".to_owned(),
        })
    );
}

#[test]
fn double_dash_escape() {
    fn schema() -> Schema<(bool, Vec<String>, Vec<String>)> {
        SchemaBuilder::new()
            .option(FlagOpt::new(["-v"]).unwrap())
            .option(RepeatableOpt::new(["-files"]).unwrap())
            .option(VarargsOpt::new(["params"]).unwrap())
            .finalize(|mut values| {
                let mut values = values.drain(..);
                Ok((
                    *values.next().unwrap().downcast::<bool>().unwrap(),
                    *values.next().unwrap().downcast::<Vec<String>>().unwrap(),
                    *values.next().unwrap().downcast::<Vec<String>>().unwrap(),
                ))
            })
            .unwrap()
    }
    let result = Splitter::from_schema(schema())
        .split(["-v", "--", "-files", "file1", "file2"])
        .unwrap();
    assert_eq!(
        result,
        (
            true,
            Vec::<String>::new(),
            vec!["-files".to_owned(), "file1".to_owned(), "file2".to_owned()]
        )
    );
}

#[test]
fn missing_required_names_the_option() {
    let schema: Schema<String> = SchemaBuilder::new()
        .option(RequiredOpt::new(["r"]).unwrap())
        .finalize(|mut values| Ok(*values.remove(0).downcast::<String>().unwrap()))
        .unwrap();
    let err = Splitter::from_schema(schema).split(Vec::<String>::new()).unwrap_err();
    match err {
        SplittingError::MissingRequired { names } => assert_eq!(names, vec!["r".to_owned()]),
        other => panic!("expected MissingRequired, got {other:?}"),
    }
}

#[test]
fn converter_round_trip() {
    let schema: Schema<Vec<PathBuf>> = SchemaBuilder::new()
        .option(
            VarargsOpt::new(["files"])
                .unwrap()
                .convert(PathBuf::from),
        )
        .finalize(|mut values| Ok(*values.remove(0).downcast::<Vec<PathBuf>>().unwrap()))
        .unwrap();
    let result = Splitter::from_schema(schema).split(["a.txt", "b.txt"]).unwrap();
    assert_eq!(result, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
}

#[test]
/// An empty input yields every option's built-in default.
fn empty_input_yields_builtin_defaults() {
    let result = Splitter::from_schema(jar_like_schema()).split(Vec::<String>::new()).unwrap();
    assert_eq!(
        result,
        CreateCommand {
            create: false,
            file: None,
            files: Vec::new(),
        }
    );
}

#[test]
/// A user-supplied default is layered on top of the kind's built-in empty value.
fn user_supplied_default_is_used_when_absent() {
    let schema: Schema<String> = SchemaBuilder::new()
        .option(SingleOpt::new(["--level"]).unwrap().default_value("info".to_owned()))
        .finalize(|mut values| Ok(values.remove(0).downcast::<Option<String>>().unwrap().unwrap()))
        .unwrap();
    let result = Splitter::from_schema(schema).split(Vec::<String>::new()).unwrap();
    assert_eq!(result, "info");
}

#[test]
/// An identity pre-processor changes nothing about the result.
fn identity_preprocessor_does_not_change_the_result() {
    let plain = Splitter::from_schema(jar_like_schema())
        .split(["--create", "--file=classes.jar", "Foo.class"])
        .unwrap();
    let preprocessed = Splitter::from_schema(jar_like_schema())
        .with_preprocess_each(|t| t)
        .split(["--create", "--file=classes.jar", "Foo.class"])
        .unwrap();
    assert_eq!(plain, preprocessed);
}

#[test]
fn schema_rejects_empty_option_list() {
    let err = SchemaBuilder::<()>::new().finalize(|_| Ok(())).unwrap_err();
    assert!(matches!(err, argsplit::InvalidSchemaError::EmptySchema));
}

#[test]
fn try_convert_propagates_errors_as_converter_failed() {
    let schema: Schema<i64> = SchemaBuilder::new()
        .option(
            RequiredOpt::new(["n"])
                .unwrap()
                .try_convert(|s: String| s.parse::<i64>().map_err(argsplit::ConvertError::new)),
        )
        .finalize(|mut values| Ok(*values.remove(0).downcast::<i64>().unwrap()))
        .unwrap();

    assert_eq!(Splitter::from_schema(schema.clone()).split(["7"]).unwrap(), 7);

    let err = Splitter::from_schema(schema).split(["not-a-number"]).unwrap_err();
    assert!(matches!(err, SplittingError::ConverterFailed { option, .. } if option == "n"));
}

#[test]
fn convert_with_uses_the_default_parser_pipeline() {
    let schema: Schema<i64> = SchemaBuilder::new()
        .option(RequiredOpt::new(["n"]).unwrap().convert_with(argsplit::default_parser::<i64>()))
        .finalize(|mut values| Ok(*values.remove(0).downcast::<i64>().unwrap()))
        .unwrap();
    assert_eq!(Splitter::from_schema(schema.clone()).split(["42"]).unwrap(), 42);
    let err = Splitter::from_schema(schema).split(["nope"]).unwrap_err();
    assert!(matches!(err, SplittingError::ConverterFailed { .. }));
}
