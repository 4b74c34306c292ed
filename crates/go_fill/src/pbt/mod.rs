// ==============================================================================
// Property-Based Tests for Struct Filling
// ==============================================================================
//
// Generates random struct types (through go_ty's proptest_support), fills
// literals of them through a mock resolver and checks the output by parsing
// it again. Every generated type lives in the request's own package, so all
// fields are visible and only `unsafe` can ever need importing.

use go_ast::SourceFile;
use go_ty::{
    arbitrary::{RecursiveParams, PBT_PACKAGE, PBT_PATH},
    NamedTy, StructTy, Ty, TypeName,
};
use proptest::prelude::{any, any_with, prop_assert, prop_assert_eq, proptest, ProptestConfig};

use crate::tests::MockResolver;
use crate::{apply_edits, fill_struct, FillOptions, FillRequest, Target};

fn target_ty(fields: &StructTy) -> Ty {
    Ty::Named(NamedTy {
        name: TypeName::new(PBT_PATH, PBT_PACKAGE, "Target"),
        args: Vec::new(),
        underlying: Ty::Struct(fields.clone()).into(),
    })
}

fn source(elements: &str) -> String {
    format!("package {PBT_PACKAGE}\n\nvar _ = Target{{{elements}}}\n")
}

fn fill(src: &str, fields: &StructTy, recurse: bool) -> String {
    let file = SourceFile::parse(src);
    let target = Target::Offset(src.find("Target{").unwrap());
    let request = FillRequest {
        file: &file,
        path: None,
        package_path: PBT_PATH,
        target: &target,
    };
    let options = FillOptions {
        recurse,
        ..FillOptions::default()
    };
    let mut imports = Vec::new();
    let output = fill_struct(
        &request,
        &MockResolver(target_ty(fields)),
        &options,
        &mut imports,
        None,
    )
    .unwrap()
    .unwrap();
    // `unsafe.Pointer` is the one foreign type the generator can produce.
    assert!(imports.iter().all(|i| i.path == "unsafe"), "{imports:?}");
    apply_edits(src, &output.edits)
}

/// (key, value text) of every element of the `Target` literal.
fn elements(src: &str) -> (SourceFile, Vec<(String, String)>) {
    let file = SourceFile::parse(src);
    let offset = src.find("Target{").unwrap();
    let id = file.literals_at(offset)[0];
    let elements = file[id]
        .elements
        .iter()
        .map(|e| {
            let key = e.key.as_ref().map(|k| k.text.to_string()).unwrap_or_default();
            (key, file.slice(&e.value).to_string())
        })
        .collect();
    (file, elements)
}

fn params() -> RecursiveParams {
    RecursiveParams {
        depth: 2,
        desired_size: 16,
        expected_branch_size: 2,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128, .. ProptestConfig::default()
    })]

    /// Filling `T{}` yields every field once, keyed, in declaration order.
    #[test]
    fn test_field_coverage(fields in any_with::<StructTy>(params()), recurse in any::<bool>()) {
        let filled = fill(&source(""), &fields, recurse);
        let (file, elements) = elements(&filled);
        prop_assert!(file.diags.is_empty(), "{:?}\n{}", file.diags, filled);

        let keys: Vec<&str> = elements.iter().map(|(k, _)| k.as_str()).collect();
        let names: Vec<&str> = fields.fields.iter().map(|f| f.name.as_str()).collect();
        prop_assert_eq!(keys, names);
    }

    #[test]
    fn test_idempotence(fields in any_with::<StructTy>(params()), recurse in any::<bool>()) {
        let once = fill(&source(""), &fields, recurse);
        let twice = fill(&once, &fields, recurse);
        prop_assert_eq!(once, twice);
    }

    /// User-written values come through byte for byte, whatever else is
    /// synthesized around them.
    #[test]
    fn test_value_preservation(fields in any_with::<StructTy>(params()), mask in any::<u32>()) {
        let supplied: Vec<(usize, String)> = fields
            .fields
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << (i % 32)) != 0)
            .map(|(i, f)| (i, format!("{}: make{i}( \"a,b\" , []int{{1, 2}})", f.name)))
            .collect();
        let written: Vec<&str> = supplied.iter().map(|(_, text)| text.as_str()).collect();
        let filled = fill(&source(&written.join(", ")), &fields, false);
        let (_, elements) = elements(&filled);

        for (i, _) in &supplied {
            let (key, value) = &elements[*i];
            prop_assert_eq!(key, fields.fields[*i].name.as_str());
            prop_assert_eq!(value, &format!("make{i}( \"a,b\" , []int{{1, 2}})"));
        }
    }
}
