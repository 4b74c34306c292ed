// ==============================================================================
// Type Resolution
// ==============================================================================
//
// Turns the type written in front of a composite literal into a `Ty` whose
// underlying struct lists the fields to fill. `TypeResolver` is the seam:
// the fill pipeline only needs a struct descriptor, and tests plug in fixed
// descriptor trees. `SourceResolver` is the real thing, reading declarations
// from the request file, its sibling files and imported packages.
//
// Only types in value position are resolved in full. Behind a pointer,
// slice, map, channel or function the zero value is `nil` whatever the
// element is, so those element types are just named (`Mode::Shallow`) and
// their packages are never loaded.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use go_ast::{ArrayLen as AstArrayLen, FieldDecl, SourceFile, TypeDeclId, TypeExpr};
use go_ty::{
    error_ty, ArrayLen, Field, NamedTy, PrimitiveTy, StructTy, Ty, TyRef, TypeName,
};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use crate::db::{Package, PackageDb};
use crate::imports::FileQualifier;

/// A struct type ready to be filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStruct {
    /// The literal's type: `Named` for declared types, `Struct` for
    /// anonymous ones.
    pub ty: Ty,
    pub fields: StructTy,
    /// Package that declares the fields; decides which unexported fields may
    /// be filled.
    pub package_path: SmolStr,
}

impl ResolvedStruct {
    pub fn new(ty: Ty, package_path: impl Into<SmolStr>) -> Option<Self> {
        let fields = ty.as_struct()?.clone();
        Some(Self {
            ty,
            fields,
            package_path: package_path.into(),
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("cannot resolve type `{0}`")]
    Unresolved(SmolStr),
    #[error("`{name}` is not a struct type")]
    NotAStruct { name: SmolStr, underlying: String },
    #[error("cancelled")]
    Cancelled,
}

/// Where the literal being filled lives.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub file: &'a SourceFile,
    /// On-disk location of `file`; used to find the sibling files of its
    /// package. The on-disk copy of the file itself is never read.
    pub path: Option<&'a Path>,
    pub package_path: &'a str,
    /// Offset of the literal, for function-local declarations.
    pub offset: usize,
    pub cancel: Option<&'a Arc<AtomicBool>>,
}

impl Scope<'_> {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|f| f.load(Ordering::Relaxed))
    }
}

pub trait TypeResolver {
    fn resolve(&self, ty: &TypeExpr, scope: &Scope<'_>) -> Result<ResolvedStruct, ResolveError>;
}

pub struct SourceResolver<'db> {
    db: &'db PackageDb,
}

impl<'db> SourceResolver<'db> {
    pub fn new(db: &'db PackageDb) -> Self {
        Self { db }
    }
}

impl TypeResolver for SourceResolver<'_> {
    fn resolve(&self, ty: &TypeExpr, scope: &Scope<'_>) -> Result<ResolvedStruct, ResolveError> {
        let mut cx = ResolveCx {
            db: self.db,
            scope,
            visiting: Vec::new(),
        };
        let package = match scope.path.and_then(Path::parent) {
            Some(dir) => {
                cx.check_cancelled()?;
                self.db.load_dir(dir)
            }
            None => None,
        };
        let env = Env {
            file: scope.file,
            package,
            skip: scope.path,
            path: scope.package_path.into(),
            name: scope.file.package.clone().unwrap_or_default(),
            offset: Some(scope.offset),
            subst: FxHashMap::default(),
        };

        let resolved = cx.ty(&env, ty, Mode::Root)?;
        let package_path = match &resolved {
            Ty::Named(named) => named.name.path.clone(),
            _ => SmolStr::from(scope.package_path),
        };
        if resolved.as_struct().is_none() {
            let q = FileQualifier::new(scope.file, scope.package_path);
            return Err(ResolveError::NotAStruct {
                name: resolved.display(&q).to_string().into(),
                underlying: resolved.underlying().display(&q).to_string(),
            });
        }
        log::debug!("resolved {:?}", resolved);
        ResolvedStruct::new(resolved, package_path)
            .ok_or_else(|| ResolveError::Unresolved(type_expr_name(ty)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// The literal's own type: failing to find it is an error.
    Root,
    /// Value position inside it; unknown names degrade to `Opaque`.
    Value,
    /// Behind an indirection; names are spelled, never looked into.
    Shallow,
}

impl Mode {
    fn nested(self) -> Mode {
        match self {
            Mode::Root | Mode::Value => Mode::Value,
            Mode::Shallow => Mode::Shallow,
        }
    }
}

/// Names visible from one file, plus generic substitutions in effect.
struct Env<'a> {
    file: &'a SourceFile,
    package: Option<Arc<Package>>,
    /// The request file's on-disk copy, shadowed by `file`.
    skip: Option<&'a Path>,
    path: SmolStr,
    name: SmolStr,
    /// Set only in the request file, where function-local types are visible.
    offset: Option<usize>,
    subst: FxHashMap<SmolStr, Ty>,
}

/// Where a type declaration was found.
struct Site {
    package: Option<Arc<Package>>,
    /// Index into `package.files`; `None` is the env's own file.
    file: Option<usize>,
    decl: TypeDeclId,
    path: SmolStr,
    name: SmolStr,
    local: bool,
}

impl Site {
    fn source<'s>(&'s self, own: &'s SourceFile) -> &'s SourceFile {
        match (&self.package, self.file) {
            (Some(package), Some(i)) => &package.files[i].source,
            _ => own,
        }
    }
}

enum Found {
    Ty(Ty),
    Decl(Site),
}

struct ResolveCx<'a> {
    db: &'a PackageDb,
    scope: &'a Scope<'a>,
    visiting: Vec<TypeName>,
}

impl ResolveCx<'_> {
    fn check_cancelled(&self) -> Result<(), ResolveError> {
        if self.scope.is_cancelled() {
            log::info!("type resolution: cancelled");
            return Err(ResolveError::Cancelled);
        }
        Ok(())
    }

    fn load(&self, path: &str) -> Result<Option<Arc<Package>>, ResolveError> {
        self.check_cancelled()?;
        Ok(self.db.load(path))
    }

    fn ty(&mut self, env: &Env<'_>, expr: &TypeExpr, mode: Mode) -> Result<Ty, ResolveError> {
        let ty = match expr {
            TypeExpr::Name {
                qualifier,
                name,
                args,
            } => return self.name(env, qualifier.as_deref(), name, args, mode),
            TypeExpr::Pointer(elem) => Ty::Pointer(self.ty(env, elem, Mode::Shallow)?.into()),
            TypeExpr::Slice(elem) => Ty::Slice(self.ty(env, elem, Mode::Shallow)?.into()),
            TypeExpr::Array { len, elem } => Ty::Array {
                len: self.array_len(env, len),
                elem: self.ty(env, elem, mode.nested())?.into(),
            },
            TypeExpr::Map { key, value } => Ty::Map {
                key: self.ty(env, key, Mode::Shallow)?.into(),
                value: self.ty(env, value, Mode::Shallow)?.into(),
            },
            TypeExpr::Chan { dir, elem } => Ty::Chan {
                dir: *dir,
                elem: self.ty(env, elem, Mode::Shallow)?.into(),
            },
            TypeExpr::Func { text } => Ty::Func(text.clone()),
            TypeExpr::Interface { text } => Ty::Interface(text.clone()),
            TypeExpr::Struct { fields } => Ty::Struct(self.fields(env, fields, mode.nested())?),
        };
        Ok(ty)
    }

    fn fields(
        &mut self,
        env: &Env<'_>,
        decls: &[FieldDecl],
        mode: Mode,
    ) -> Result<StructTy, ResolveError> {
        let mut fields = Vec::new();
        for decl in decls {
            let ty = TyRef::from(self.ty(env, &decl.ty, mode)?);
            if decl.is_embedded() {
                if let Some(name) = decl.embedded_name() {
                    fields.push(Field::new(name, ty).embedded().with_tag(decl.tag.clone()));
                }
                continue;
            }
            for name in &decl.names {
                fields.push(Field::new(name.clone(), ty.clone()).with_tag(decl.tag.clone()));
            }
        }
        Ok(StructTy::new(fields))
    }

    fn array_len(&self, env: &Env<'_>, len: &AstArrayLen) -> ArrayLen {
        match len {
            AstArrayLen::Int(n) => ArrayLen::Known(*n),
            AstArrayLen::Ellipsis => ArrayLen::Symbolic("...".into()),
            AstArrayLen::Expr(text) => {
                let value = env.file.package_const(text).or_else(|| {
                    env.package
                        .as_ref()
                        .and_then(|package| package.find_const(text))
                });
                match value {
                    Some(n) => ArrayLen::Known(n),
                    None => ArrayLen::Symbolic(text.clone()),
                }
            }
        }
    }

    fn name(
        &mut self,
        env: &Env<'_>,
        qualifier: Option<&str>,
        name: &str,
        args: &[TypeExpr],
        mode: Mode,
    ) -> Result<Ty, ResolveError> {
        let import = match qualifier {
            Some(q) => self.import_named(env, q)?,
            None => None,
        };
        if let Some(q) = qualifier {
            let path = import.as_ref().map(|(path, _)| path.as_str());
            if path == Some("unsafe") && name == "Pointer" {
                return Ok(Ty::Primitive(PrimitiveTy::UnsafePointer));
            }
            if mode == Mode::Shallow {
                let type_name = match &import {
                    Some((path, package)) => TypeName::new(path.clone(), package.clone(), name),
                    None => TypeName::new(q, q, name),
                };
                return self.spelled(env, type_name, args);
            }
        }

        let found = match (qualifier, &import) {
            (Some(_), Some((path, _))) => self.lookup_qualified(path, name)?,
            (Some(q), None) => {
                log::debug!("no import named {q:?}");
                None
            }
            (None, _) => self.lookup(env, name)?,
        };
        match (found, mode) {
            (Some(Found::Ty(ty)), _) => Ok(ty),
            (Some(Found::Decl(site)), Mode::Shallow) => {
                let type_name = TypeName::new(site.path, site.name, name);
                self.spelled(env, type_name, args)
            }
            (Some(Found::Decl(site)), _) => self.declared(env, site, args),
            (None, Mode::Root) => Err(ResolveError::Unresolved(match qualifier {
                Some(q) => format!("{q}.{name}").into(),
                None => name.into(),
            })),
            (None, _) => {
                let type_name = match qualifier {
                    Some(q) => {
                        let path = import.map_or_else(|| SmolStr::from(q), |(path, _)| path);
                        TypeName::new(path, q, name)
                    }
                    None => TypeName::new(env.path.clone(), env.name.clone(), name),
                };
                log::debug!("cannot see into {type_name:?}; treating it as opaque");
                self.spelled(env, type_name, args)
            }
        }
    }

    /// A named type we only need to spell, never to look into.
    fn spelled(
        &mut self,
        env: &Env<'_>,
        type_name: TypeName,
        args: &[TypeExpr],
    ) -> Result<Ty, ResolveError> {
        if args.is_empty() {
            return Ok(Ty::Opaque(type_name));
        }
        let args = args
            .iter()
            .map(|arg| self.ty(env, arg, Mode::Shallow).map(TyRef::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Ty::Named(NamedTy {
            underlying: Ty::Opaque(type_name.clone()).into(),
            name: type_name,
            args,
        }))
    }

    fn lookup(&mut self, env: &Env<'_>, name: &str) -> Result<Option<Found>, ResolveError> {
        if let Some(ty) = env.subst.get(name) {
            return Ok(Some(Found::Ty(ty.clone())));
        }
        let here = |decl: TypeDeclId, local: bool| {
            Found::Decl(Site {
                package: None,
                file: None,
                decl,
                path: env.path.clone(),
                name: env.name.clone(),
                local,
            })
        };
        if let Some(decl) = env.offset.and_then(|offset| env.file.local_type(name, offset)) {
            return Ok(Some(here(decl, true)));
        }
        if let Some(decl) = env.file.package_type(name) {
            return Ok(Some(here(decl, false)));
        }
        if let Some(package) = &env.package {
            if let Some((file, decl)) = package.find_type(name, env.skip) {
                return Ok(Some(Found::Decl(Site {
                    package: Some(package.clone()),
                    file: Some(file),
                    decl,
                    path: env.path.clone(),
                    name: env.name.clone(),
                    local: false,
                })));
            }
        }
        if let Some(ty) = predeclared(name) {
            return Ok(Some(Found::Ty(ty)));
        }
        for spec in env.file.imports.iter().filter(|spec| spec.is_dot()) {
            let Some(package) = self.load(&spec.path)? else {
                continue;
            };
            if let Some(found) = in_package(package, name) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn lookup_qualified(&mut self, path: &str, name: &str) -> Result<Option<Found>, ResolveError> {
        Ok(self.load(path)?.and_then(|package| in_package(package, name)))
    }

    /// Import path and package name `qualifier` stands for in the file. An
    /// unaliased import binds the name from the package clause, which may
    /// differ from its last path element.
    fn import_named(
        &mut self,
        env: &Env<'_>,
        qualifier: &str,
    ) -> Result<Option<(SmolStr, SmolStr)>, ResolveError> {
        if let Some(spec) = env.file.import_by_name(qualifier) {
            return Ok(Some((spec.path.clone(), spec.default_name())));
        }
        for spec in env.file.imports.iter().filter(|spec| spec.name.is_none()) {
            let Some(package) = self.load(&spec.path)? else {
                continue;
            };
            if package.name == qualifier {
                return Ok(Some((spec.path.clone(), package.name.clone())));
            }
        }
        Ok(None)
    }

    fn declared(&mut self, env: &Env<'_>, site: Site, args: &[TypeExpr]) -> Result<Ty, ResolveError> {
        let args = args
            .iter()
            .map(|arg| self.type_arg(env, arg))
            .collect::<Result<Vec<_>, _>>()?;

        let file = site.source(env.file);
        let decl = &file[site.decl];
        let subst = decl
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let arg = args.get(i).cloned().unwrap_or_else(|| Ty::TypeParam(param.clone()));
                (param.clone(), arg)
            })
            .collect();
        let inner = Env {
            file,
            package: match &site.package {
                Some(package) => Some(package.clone()),
                None => env.package.clone(),
            },
            skip: env.skip,
            path: site.path.clone(),
            name: site.name.clone(),
            offset: if site.local { env.offset } else { None },
            subst,
        };

        if decl.alias {
            return self.ty(&inner, &decl.ty, Mode::Value);
        }

        let type_name = TypeName::new(site.path.clone(), site.name.clone(), decl.name.clone());
        if self.visiting.contains(&type_name) {
            return Ok(Ty::Opaque(type_name));
        }
        self.visiting.push(type_name.clone());
        let underlying = self.ty(&inner, &decl.ty, Mode::Value);
        self.visiting.pop();

        Ok(Ty::Named(NamedTy {
            name: type_name,
            args: args.into_iter().map(TyRef::from).collect(),
            underlying: underlying?.into(),
        }))
    }

    /// Type arguments may name the enclosing function's type parameters,
    /// which are not declarations we track; those stay symbolic.
    fn type_arg(&mut self, env: &Env<'_>, arg: &TypeExpr) -> Result<Ty, ResolveError> {
        if let TypeExpr::Name {
            qualifier: None,
            name,
            args,
        } = arg
        {
            if args.is_empty() && self.lookup(env, name)?.is_none() {
                return Ok(Ty::TypeParam(name.clone()));
            }
        }
        self.ty(env, arg, Mode::Value)
    }
}

fn in_package(package: Arc<Package>, name: &str) -> Option<Found> {
    let (file, decl) = package.find_type(name, None)?;
    Some(Found::Decl(Site {
        path: package.path.clone(),
        name: package.name.clone(),
        package: Some(package),
        file: Some(file),
        decl,
        local: false,
    }))
}

fn predeclared(name: &str) -> Option<Ty> {
    if let Some(p) = PrimitiveTy::from_name(name) {
        return Some(Ty::Primitive(p));
    }
    match name {
        "error" => Some(error_ty()),
        "any" | "comparable" => Some(Ty::Interface(name.into())),
        _ => None,
    }
}

fn type_expr_name(ty: &TypeExpr) -> SmolStr {
    match ty {
        TypeExpr::Name {
            qualifier: Some(q),
            name,
            ..
        } => format!("{q}.{name}").into(),
        TypeExpr::Name { name, .. } => name.clone(),
        other => format!("{other:?}").into(),
    }
}
