use crate::{ArrayLen, Field, NamedTy, PrimitiveTy, StructTy, Ty, TyRef, TypeName};
use proptest::{
    prelude::{any, prop, prop_oneof, Arbitrary, BoxedStrategy, Just, Strategy},
    prop_compose,
};
use smol_str::SmolStr;

/// Package every generated named type claims to live in.
pub const PBT_PATH: &str = "example.com/pbt";
pub const PBT_PACKAGE: &str = "pbt";

#[derive(Debug, Clone, Copy)]
pub struct RecursiveParams {
    pub depth: u32,
    pub desired_size: u32,
    pub expected_branch_size: u32,
}

impl Default for RecursiveParams {
    fn default() -> Self {
        Self {
            depth: 3,
            desired_size: 32,
            expected_branch_size: 3,
        }
    }
}

fn pbt_name(name: SmolStr) -> TypeName {
    TypeName::new(PBT_PATH, PBT_PACKAGE, name)
}

fn arb_ty(args: RecursiveParams) -> BoxedStrategy<Ty> {
    let leaf = prop_oneof![
        4 => any::<PrimitiveTy>().prop_map(Ty::Primitive),
        1 => arb_type_name().prop_map(|name| Ty::Opaque(pbt_name(name))),
        1 => Just(Ty::Interface("any".into())),
        1 => Just(Ty::Func("func() error".into())),
    ];

    leaf.prop_recursive(
        args.depth,
        args.desired_size,
        args.expected_branch_size,
        |inner| {
            let inner = inner.prop_map(TyRef::from);

            prop_oneof![
                inner.clone().prop_map(Ty::Pointer),
                inner.clone().prop_map(Ty::Slice),
                (0u64..4, inner.clone()).prop_map(|(n, elem)| Ty::Array {
                    len: ArrayLen::Known(n),
                    elem
                }),
                (inner.clone(), inner.clone()).prop_map(|(key, value)| Ty::Map { key, value }),
                arb_fields(inner.clone()).prop_map(|fields| Ty::Struct(StructTy::new(fields))),
                (arb_type_name(), arb_fields(inner)).prop_map(|(name, fields)| {
                    Ty::Named(NamedTy {
                        name: pbt_name(name),
                        args: Vec::new(),
                        underlying: Ty::Struct(StructTy::new(fields)).into(),
                    })
                }),
            ]
        },
    )
    .boxed()
}

fn arb_fields(
    ty: impl Strategy<Value = TyRef> + Clone,
) -> impl Strategy<Value = Vec<Field>> {
    prop::collection::btree_map(arb_field_name(), ty, 0..5).prop_map(|map| {
        map.into_iter()
            .map(|(name, ty)| Field::new(name, ty))
            .collect()
    })
}

prop_compose! {
    // prefixes keep generated names clear of Go keywords
    fn arb_field_name()(string in "[Ff]ield[A-Za-z0-9]{0,6}") -> SmolStr {
        string.into()
    }
}

prop_compose! {
    fn arb_type_name()(string in "T[A-Za-z0-9]{0,8}") -> SmolStr {
        string.into()
    }
}

impl Arbitrary for Ty {
    type Parameters = RecursiveParams;
    type Strategy = BoxedStrategy<Ty>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        arb_ty(args)
    }
}

impl Arbitrary for StructTy {
    type Parameters = RecursiveParams;
    type Strategy = BoxedStrategy<StructTy>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        arb_fields(arb_ty(args).prop_map(TyRef::from))
            .prop_map(StructTy::new)
            .boxed()
    }
}

impl Arbitrary for PrimitiveTy {
    type Parameters = ();
    type Strategy = BoxedStrategy<PrimitiveTy>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop::sample::select(PrimitiveTy::ALL.to_vec()).boxed()
    }
}
