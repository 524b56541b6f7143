use crate::ast::*;
use crate::syntax::consteval;
use crate::syntax::span::{Span, Spanned};
use crate::transpile::image_format;
use crate::typecheck::types::arg_name;
use crate::typecheck::{resolve_type, Ty};

use super::{BindingDecl, BindingKind, Rewriter};

/// The workgroup-size field.
const LOCAL_SIZE: &str = "local_size";

impl Rewriter<'_, '_> {
    pub(super) fn rewrite_field(&mut self, decl: &VarDecl) {
        if decl.name() == Some(LOCAL_SIZE) {
            self.rewrite_local_size(decl);
            return;
        }
        match resolve_type(&decl.ty, self.ctx.env) {
            Ty::Buffer(elem) => self.rewrite_buffer(decl, &elem),
            Ty::Image { format, dim } => self.rewrite_image(decl, &format, dim),
            Ty::Uniform(inner) => self.rewrite_uniform(decl, &inner),
            _ => {
                if self.rewrite_array(decl, true) {
                    return;
                }
                self.rewrite_specifiers(decl);
                self.rewrite_plain_decl(decl);
            }
        }
    }

    /// Template arguments of the field type's last path segment.
    fn binding_args<'d>(&self, decl: &'d VarDecl) -> &'d [TemplateArg] {
        match &decl.ty.base {
            TypeBase::Path(path) => path
                .last()
                .and_then(|s| s.template_args.as_ref())
                .map(|t| t.args.as_slice())
                .unwrap_or(&[]),
            _ => &[],
        }
    }

    /// A non-negative constant template argument; `default` when absent.
    fn index_arg(
        &mut self,
        args: &[TemplateArg],
        i: usize,
        default: Option<u32>,
        what: &str,
        field: &Spanned<String>,
    ) -> Option<u32> {
        let Some(arg) = args.get(i) else {
            if default.is_none() {
                self.warn(format!("'{}' has no {} argument", field.node, what), field.span);
            }
            return default;
        };
        let value = consteval::eval_template_arg(arg, self.ctx.env)
            .and_then(|v| u32::try_from(v).ok());
        if value.is_none() {
            self.warn(
                format!("{} of '{}' is not a non-negative constant", what, field.node),
                arg.span(),
            );
        }
        value
    }

    /// Spelling of a binding's element type. Types without a GLSL mapping
    /// pass through under their own unqualified name.
    fn element_name(
        &mut self,
        elem: &Ty,
        arg: Option<&TemplateArg>,
        field: &Spanned<String>,
    ) -> String {
        if let Some(name) = elem.glsl_name() {
            return name;
        }
        let written = arg.and_then(arg_name).unwrap_or("?").to_string();
        self.warn(
            format!(
                "element type of '{}' has no GLSL mapping; using '{}'",
                field.node, written
            ),
            arg.map_or(field.span, TemplateArg::span),
        );
        written
    }

    /// `BufferBinding<T, B, S> name;` becomes a storage block.
    fn rewrite_buffer(&mut self, decl: &VarDecl, elem: &Ty) {
        let d = &decl.declarators[0];
        let args = self.binding_args(decl);
        let Some(binding) = self.index_arg(args, 1, None, "binding", &d.name) else {
            return;
        };
        let Some(set) = self.index_arg(args, 2, Some(0), "set", &d.name) else {
            return;
        };
        let element = self.element_name(elem, args.first(), &d.name);
        let name = &d.name.node;
        tracing::debug!(field = %name, binding, set, "buffer binding");
        self.edits.replace(
            decl.span,
            format!(
                "layout(set={}, binding={}) buffer _{}Layout {{ {} {}[]; }};",
                set, binding, name, element, name
            ),
        );
        self.out.bindings.push(BindingDecl {
            kind: BindingKind::Buffer,
            element,
            dim: None,
            binding,
            set,
            name: name.clone(),
        });
    }

    /// `ImageBinding<Format, Dim, Pixel, B, S> name;` becomes an image uniform.
    fn rewrite_image(&mut self, decl: &VarDecl, format: &str, dim: u32) {
        let d = &decl.declarators[0];
        let Some(fmt) = image_format::lookup(format) else {
            self.warn(
                format!("image format '{}' of '{}' has no GLSL qualifier", format, d.name.node),
                decl.ty.span,
            );
            return;
        };
        let Some(suffix) = image_format::dim_suffix(dim) else {
            self.warn(
                format!("image '{}' must be 1-, 2- or 3-dimensional", d.name.node),
                decl.ty.span,
            );
            return;
        };
        let args = self.binding_args(decl);
        let Some(binding) = self.index_arg(args, 3, None, "binding", &d.name) else {
            return;
        };
        let Some(set) = self.index_arg(args, 4, Some(0), "set", &d.name) else {
            return;
        };
        let name = &d.name.node;
        tracing::debug!(field = %name, format, dim, binding, "image binding");
        self.edits.replace(
            decl.span,
            format!(
                "layout(binding={},{}) uniform {}image{} {};",
                binding,
                fmt.qualifier,
                fmt.scalar.type_prefix(),
                suffix,
                name
            ),
        );
        self.out.bindings.push(BindingDecl {
            kind: BindingKind::Image,
            element: fmt.scalar.texel_kind().glsl_name().to_string(),
            dim: Some(dim),
            binding,
            set,
            name: name.clone(),
        });
    }

    /// `Uniform<T, L> name{init};` becomes `layout(location=L) uniform T name;`.
    fn rewrite_uniform(&mut self, decl: &VarDecl, inner: &Ty) {
        let d = &decl.declarators[0];
        let args = self.binding_args(decl);
        let Some(location) = self.index_arg(args, 1, None, "location", &d.name) else {
            return;
        };
        let element = self.element_name(inner, args.first(), &d.name);
        let name = &d.name.node;
        tracing::debug!(field = %name, location, "uniform");
        self.edits.replace(
            decl.span,
            format!("layout(location={}) uniform {} {};", location, element, name),
        );
        self.out.bindings.push(BindingDecl {
            kind: BindingKind::Uniform,
            element,
            dim: None,
            binding: location,
            set: 0,
            name: name.clone(),
        });
    }

    /// `tc::uvec3 local_size{x, y, z};` becomes the workgroup layout.
    fn rewrite_local_size(&mut self, decl: &VarDecl) {
        let d = &decl.declarators[0];
        let args: &[Spanned<Expr>] = match &d.init {
            Some(Initializer::Braced(list)) => &list.elems,
            Some(Initializer::Paren { args, .. }) => args,
            Some(Initializer::Assign { value, .. }) => match &Expr::unparen(value).node {
                Expr::Construct { args, .. } | Expr::Call { args, .. } => args,
                Expr::InitList(list) => &list.elems,
                _ => &[],
            },
            None => &[],
        };
        let sizes: Option<Vec<i64>> = args
            .iter()
            .map(|a| consteval::eval_int(a, self.ctx.env))
            .collect();
        match sizes.as_deref() {
            Some(&[x, y, z]) => {
                tracing::debug!(x, y, z, "workgroup size");
                self.edits.replace(
                    decl.span,
                    format!(
                        "layout(local_size_x={}, local_size_y={}, local_size_z={}) in;",
                        x, y, z
                    ),
                );
            }
            _ => self.warn(
                "local_size is not initialised with three constant integers; left unconverted"
                    .to_string(),
                d.span,
            ),
        }
    }

    /// Leading `static`/`constexpr` become `const` (or vanish).
    fn rewrite_specifiers(&mut self, decl: &VarDecl) {
        let Some(first) = decl.specifiers.first() else {
            return;
        };
        let constant = decl.has_spec(DeclSpec::Constexpr) && !decl.ty.is_const();
        let text = if constant { "const " } else { "" };
        self.edits
            .replace(Span::new(first.span.start, decl.ty.span.start), text);
    }

    /// Fixed-size arrays: `T name[N] = {...}` and `std::array<T, N> name{...}`
    /// become `T name[N] = T[N](...)`. Returns whether the rule fired.
    pub(super) fn rewrite_array(&mut self, decl: &VarDecl, is_field: bool) -> bool {
        let Some((elem, len)) = self.array_shape(decl) else {
            return false;
        };
        let d = &decl.declarators[0];
        let constant = is_field
            || decl.ty.is_const()
            || decl.has_spec(DeclSpec::Constexpr);
        let prefix = if constant { "const " } else { "" };
        let name = &d.name.node;

        let list = match &d.init {
            Some(Initializer::Braced(list)) => Some(list),
            Some(Initializer::Assign { value, .. }) => match &value.node {
                Expr::InitList(list) => Some(list),
                _ => None,
            },
            _ => None,
        };

        match (list, &d.init) {
            (Some(list), _) => {
                let len = len.unwrap_or_else(|| list.elems.len().to_string());
                self.edits.replace(
                    Span::new(decl.span.start, list.open.start),
                    format!("{}{} {}[{}] = {}[{}]", prefix, elem, name, len, elem, len),
                );
                self.braces_to_parens(list.open, list.close);
                for e in &list.elems {
                    self.rewrite_expr(e);
                }
            }
            (None, None) => {
                let Some(len) = len else {
                    return false;
                };
                // No initializer: a `const` array would be ill-formed.
                self.edits.replace(
                    Span::new(decl.span.start, d.span.end),
                    format!("{} {}[{}]", elem, name, len),
                );
            }
            (None, Some(_)) => return false,
        }
        tracing::debug!(name = %name, elem = %elem, "fixed-size array");
        true
    }

    /// Element spelling and length of a single-declarator,
    /// one-dimensional array declaration.
    fn array_shape(&self, decl: &VarDecl) -> Option<(String, Option<String>)> {
        let [d] = decl.declarators.as_slice() else {
            return None;
        };
        match d.array_dims.as_slice() {
            [dim] => {
                let elem_ty = resolve_type(&decl.ty, self.ctx.env);
                if !matches!(elem_ty, Ty::Scalar(_) | Ty::Vector(..) | Ty::Record(_)) {
                    return None;
                }
                let elem = self.glsl_spelling(&decl.ty)?;
                let len = dim.size.as_ref().map(|size| {
                    consteval::eval_int(size, self.ctx.env)
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| self.ctx.source.slice(size.span).to_string())
                });
                Some((elem, len))
            }
            [] => {
                let Ty::Array(elem_ty, n) = resolve_type(&decl.ty, self.ctx.env) else {
                    return None;
                };
                if matches!(*elem_ty, Ty::Array(..)) {
                    return None;
                }
                let TypeBase::Path(path) = &decl.ty.base else {
                    return None;
                };
                let args = &path.last()?.template_args.as_ref()?.args;
                let elem = match elem_ty.glsl_name() {
                    Some(name) => name,
                    None => match args.first()? {
                        TemplateArg::Type(t) => self.glsl_spelling(t)?,
                        TemplateArg::Expr(_) => return None,
                    },
                };
                let len = if n > 0 {
                    n.to_string()
                } else {
                    self.ctx.source.slice(args.get(1)?.span()).to_string()
                };
                Some((elem, Some(len)))
            }
            _ => None,
        }
    }

    /// Fields and locals no other rule claims: map the type spelling and
    /// turn initializers into GLSL constructor syntax.
    pub(super) fn rewrite_plain_decl(&mut self, decl: &VarDecl) {
        let inferred = decl
            .declarators
            .first()
            .and_then(|d| self.ctx.types.decl_ty(d.name.span))
            .cloned();
        self.map_type(&decl.ty, inferred.as_ref());

        for d in &decl.declarators {
            if d.array_dims.len() > 1 {
                self.warn(
                    format!("multi-dimensional array '{}' is not translated", d.name.node),
                    d.span,
                );
                continue;
            }
            let type_name = self
                .ctx
                .types
                .decl_ty(d.name.span)
                .and_then(Ty::glsl_name)
                .or_else(|| self.glsl_spelling(&decl.ty));
            self.rewrite_declarator_init(d, type_name);
        }
    }
}
