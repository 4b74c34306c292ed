use indoc::indoc;

use crate::{parse, ArrayLen, ChanDir, SourceFile, TypeExpr};

#[track_caller]
fn parse_clean(src: &str) -> SourceFile {
    let file = parse(src);
    assert!(file.diags.is_empty(), "unexpected diagnostics: {:?}", file.diags);
    file
}

#[track_caller]
fn literal_types(file: &SourceFile) -> Vec<&str> {
    file.literals()
        .map(|(_, lit)| file.slice(&lit.ty_span))
        .collect()
}

#[track_caller]
fn field_types(file: &SourceFile, name: &str) -> Vec<(Vec<String>, TypeExpr)> {
    let id = file.package_type(name).expect("type not found");
    let TypeExpr::Struct { fields } = &file[id].ty else {
        panic!("{name} is not a struct");
    };
    fields
        .iter()
        .map(|f| {
            (
                f.names.iter().map(|n| n.to_string()).collect(),
                f.ty.clone(),
            )
        })
        .collect()
}

#[test]
fn package_imports_and_struct() {
    let file = parse_clean(indoc! {r#"
        package main

        import (
            "fmt"
            t "time"
            . "strings"
            _ "embed"
        )

        type Struct struct {
            String string
            Number int
            Float  float64
            Time   t.Time
        }

        func main() {
            myStruct := Struct{}
            fmt.Println(myStruct)
        }
    "#});

    assert_eq!(file.package.as_deref(), Some("main"));
    assert_eq!(file.imports.len(), 4);
    assert_eq!(file.imports[0].local_name().as_deref(), Some("fmt"));
    assert_eq!(file.imports[1].local_name().as_deref(), Some("t"));
    assert!(file.imports[2].is_dot());
    assert_eq!(file.imports[2].local_name(), None);
    assert_eq!(file.imports[3].local_name(), None);
    assert_eq!(file.import_by_name("t").map(|i| i.path.as_str()), Some("time"));

    let fields = field_types(&file, "Struct");
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0], (vec!["String".into()], TypeExpr::name("string")));
    assert_eq!(fields[3], (vec!["Time".into()], TypeExpr::qualified("t", "Time")));

    assert_eq!(literal_types(&file), vec!["Struct"]);
    let (_, lit) = file.literals().next().unwrap();
    assert!(lit.elements.is_empty());
    assert_eq!(file.slice(&lit.brace_span()), "{}");
}

#[test]
fn single_import_and_default_names() {
    let file = parse_clean(indoc! {r#"
        package p

        import "gopkg.in/yaml.v3"
        import m "example.com/go-mod/v2"
    "#});
    assert_eq!(file.imports[0].local_name().as_deref(), Some("yaml"));
    assert_eq!(file.imports[1].default_name(), "mod");
    assert_eq!(file.imports[1].local_name().as_deref(), Some("m"));
}

#[test]
fn literal_elements_keep_comments() {
    let file = parse_clean(indoc! {"
        package p

        var x = T{
            // leading
            A: 1, // trailing
            B: f(1, 2),
            // dangling
        }
    "});

    let (_, lit) = file.literals().next().unwrap();
    assert_eq!(lit.elements.len(), 2);

    let a = &lit.elements[0];
    assert_eq!(a.key.as_ref().map(|k| k.text.as_str()), Some("A"));
    assert_eq!(file.slice(&a.value), "1");
    assert_eq!(a.leading, vec!["// leading"]);
    assert_eq!(a.trailing.as_deref(), Some("// trailing"));

    let b = &lit.elements[1];
    assert_eq!(file.slice(&b.value), "f(1, 2)");
    assert!(b.leading.is_empty());
    assert_eq!(b.trailing, None);

    assert_eq!(lit.dangling, vec!["// dangling"]);
}

#[test]
fn comments_after_the_colon_are_part_of_the_value() {
    let file = parse_clean(indoc! {"
        package p

        var x = T{
            A: /* keep me */ 1,
            B: // why
                2,
            C:   3,
        }
    "});

    let (_, lit) = file.literals().next().unwrap();
    let values: Vec<&str> = lit.elements.iter().map(|e| file.slice(&e.value)).collect();
    assert_eq!(values, vec!["/* keep me */ 1", "// why\n        2", "3"]);
    assert!(lit.elements.iter().all(|e| e.leading.is_empty()));
}

#[test]
fn positional_and_non_ident_keys() {
    let file = parse_clean(indoc! {r#"
        package p

        var a = Point{1, 2}
        var m = map[string]int{"x": 1, k(): 2}
    "#});

    let lits: Vec<_> = file.literals().map(|(_, lit)| lit).collect();
    assert_eq!(lits.len(), 2);

    assert!(lits[0].elements.iter().all(|e| e.key.is_none()));
    assert_eq!(file.slice(&lits[0].elements[1].value), "2");

    let keys: Vec<_> = lits[1]
        .elements
        .iter()
        .map(|e| e.key.as_ref().map(|k| (k.text.to_string(), k.is_ident)))
        .collect();
    assert_eq!(
        keys,
        vec![
            Some(("\"x\"".to_string(), false)),
            Some(("k()".to_string(), false))
        ]
    );
}

#[test]
fn header_blocks_are_not_literals() {
    let file = parse_clean(indoc! {"
        package p

        func f() {
            if v := (T{}); v.ok {
            }
            for _, s := range []S{{A: 1}} {
                _ = s
            }
            switch x {
            case U{}:
            }
        }
    "});

    assert_eq!(literal_types(&file), vec!["T", "[]S", "U"]);
}

#[test]
fn func_result_type_is_not_a_literal() {
    let file = parse_clean(indoc! {"
        package p

        var h = func() T {
            return T{}
        }

        func g() struct{ A int } {
            return struct{ A int }{A: 1}
        }
    "});

    assert_eq!(literal_types(&file), vec!["T", "struct{ A int }"]);
}

#[test]
fn func_literal_inside_literal() {
    let file = parse_clean(indoc! {"
        package p

        var r = Route{
            Handler: func() T {
                return T{}
            },
        }
    "});

    assert_eq!(literal_types(&file), vec!["Route", "T"]);
}

#[test]
fn local_types_shadow_package_types() {
    let src = indoc! {"
        package p

        type T struct{ A int }

        func f() {
            type T struct{ B string }
            _ = T{}
        }
    "};
    let file = parse_clean(src);

    let package = file.package_type("T").unwrap();
    assert!(file[package].scope.is_none());

    let use_site = src.find("T{}").unwrap();
    let local = file.local_type("T", use_site).unwrap();
    assert_ne!(local, package);
    assert!(file[local].scope.is_some());

    // Outside the function only the package type is visible.
    assert_eq!(file.local_type("T", src.find("type T").unwrap()), None);
}

#[test]
fn generics_aliases_arrays_and_consts() {
    let file = parse_clean(indoc! {"
        package p

        const N = 4

        const (
            KB = 1 << 10
            Mask = 0xff
        )

        type Pair[K comparable, V any] struct {
            Key   K
            Value V
        }

        type IP [4]byte
        type Alias = Pair[string, int]
        type Grid [N][N]int
    "});

    assert_eq!(file.package_const("N"), Some(4));
    assert_eq!(file.package_const("KB"), None);
    assert_eq!(file.package_const("Mask"), Some(255));

    let pair = &file[file.package_type("Pair").unwrap()];
    assert_eq!(pair.params, vec!["K", "V"]);

    let ip = &file[file.package_type("IP").unwrap()];
    assert_eq!(
        ip.ty,
        TypeExpr::Array {
            len: ArrayLen::Int(4),
            elem: Box::new(TypeExpr::name("byte")),
        }
    );

    let alias = &file[file.package_type("Alias").unwrap()];
    assert!(alias.alias);
    assert_eq!(
        alias.ty,
        TypeExpr::Name {
            qualifier: None,
            name: "Pair".into(),
            args: vec![TypeExpr::name("string"), TypeExpr::name("int")],
        }
    );

    let grid = &file[file.package_type("Grid").unwrap()];
    let TypeExpr::Array { len, .. } = &grid.ty else {
        panic!("expected array");
    };
    assert_eq!(len, &ArrayLen::Expr("N".into()));
}

#[test]
fn embedded_fields_tags_and_composite_types() {
    let file = parse_clean(indoc! {r#"
        package p

        type S struct {
            io.Reader
            *Base
            G[int]
            a, b int `json:"a"`
            fn   func(int) error
            ch   <-chan int
            m    map[string][]*T
        }
    "#});

    let id = file.package_type("S").unwrap();
    let TypeExpr::Struct { fields } = &file[id].ty else {
        panic!("expected struct");
    };
    assert_eq!(fields.len(), 7);

    let embedded: Vec<_> = fields
        .iter()
        .filter(|f| f.is_embedded())
        .filter_map(|f| f.embedded_name())
        .collect();
    assert_eq!(embedded, vec!["Reader", "Base", "G"]);

    assert_eq!(fields[3].names, vec!["a", "b"]);
    assert_eq!(fields[3].tag.as_deref(), Some("`json:\"a\"`"));
    assert_eq!(
        fields[4].ty,
        TypeExpr::Func {
            text: "func(int) error".into()
        }
    );
    assert_eq!(
        fields[5].ty,
        TypeExpr::Chan {
            dir: ChanDir::Recv,
            elem: Box::new(TypeExpr::name("int")),
        }
    );
    assert!(matches!(fields[6].ty, TypeExpr::Map { .. }));
}

#[test]
fn type_switch_is_not_a_declaration() {
    let file = parse_clean(indoc! {"
        package p

        func f(x any) {
            switch y := x.(type) {
            case T:
                _ = y
            }
        }
    "});
    assert_eq!(file.type_decls().count(), 0);
}

#[test]
fn literals_at_orders_innermost_first() {
    let src = indoc! {"
        package p

        var v = Outer{
            In: Inner{},
        }
    "};
    let file = parse_clean(src);
    let offset = src.find("Inner{").unwrap() + "Inner{".len();

    let hits: Vec<_> = file
        .literals_at(offset)
        .into_iter()
        .map(|id| file.slice(&file[id].ty_span))
        .collect();
    assert_eq!(hits, vec!["Inner", "Outer"]);

    assert!(file.literals_at(0).is_empty());
}

#[test]
fn indent_of_literal_line() {
    let src = "package p\n\nfunc f() {\n\t\tx := T{}\n}\n";
    let file = parse_clean(src);
    let (_, lit) = file.literals().next().unwrap();
    assert_eq!(file.indent_at(lit.lbrace), "\t\t");
}

#[test]
fn bad_field_is_reported_and_parsing_continues() {
    let file = parse(indoc! {"
        package p

        type S struct { 1 }
        type U struct{ A int }
    "});
    assert!(!file.diags.is_empty());
    assert!(file.package_type("S").is_some());
    assert!(file.package_type("U").is_some());
}
