use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, GenericArgument, Ident, PathArguments, Type,
    Variant, Visibility,
};

/// Per-variant facts the generator needs.
struct ErrorVariant<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    has_message: bool,
    cfgs: Vec<&'a Attribute>,
}

struct ErrorEnum<'a> {
    name: &'a Ident,
    vis: &'a Visibility,
    ext: Ident,
    variants: Vec<ErrorVariant<'a>>,
}

pub fn expand(input: DeriveInput) -> TokenStream {
    let Data::Enum(data) = &input.data else {
        return syn::Error::new_spanned(&input.ident, "factgate_error can only be applied to enums")
            .to_compile_error();
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        match ErrorVariant::parse(variant) {
            Ok(parsed) => variants.push(parsed),
            Err(err) => return err.to_compile_error(),
        }
    }

    let parsed = ErrorEnum {
        name: &input.ident,
        vis: &input.vis,
        ext: format_ident!("{}Ext", input.ident),
        variants,
    };

    let derives = missing_derives(&input.attrs);
    let ext_trait = parsed.ext_trait();
    let source_impls = parsed.source_conversions();
    let message_impls = parsed.message_conversions();

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        #ext_trait
        #source_impls
        #message_impls

        #[allow(dead_code)]
        fn format_context(
            context: &Option<std::borrow::Cow<'static, str>>,
        ) -> std::borrow::Cow<'static, str> {
            match context {
                Some(c) => std::borrow::Cow::Owned(format!(" ({c})")),
                None => std::borrow::Cow::Borrowed(""),
            }
        }
    }
}

impl<'a> ErrorVariant<'a> {
    fn parse(variant: &'a Variant) -> Result<Self, syn::Error> {
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "factgate_error variants must use named fields",
            ));
        };

        let mut source = None;
        let mut has_context = false;
        let mut has_message = false;

        for field in &fields.named {
            let Some(ident) = field.ident.as_ref() else { continue };
            if ident == "context" {
                if !is_optional_cow(&field.ty) {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "context field must be Option<Cow<'static, str>>",
                    ));
                }
                has_context = true;
            } else if ident == "message" {
                has_message = true;
            } else if is_source(ident, field) {
                source = Some((ident, &field.ty));
            }
        }

        if source.is_some() && !has_context {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "factgate_error requires `context: Option<Cow<'static, str>>` next to a source",
            ));
        }

        let cfgs = variant.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).collect();

        Ok(Self { ident: &variant.ident, source, has_context, has_message, cfgs })
    }

    fn is_internal(&self) -> bool {
        self.ident == "Internal"
    }
}

impl ErrorEnum<'_> {
    fn ext_trait(&self) -> TokenStream {
        let name = self.name;
        let vis = self.vis;
        let ext = &self.ext;

        let arms: Vec<TokenStream> = self
            .variants
            .iter()
            .filter(|v| v.has_context)
            .map(|v| {
                let ident = v.ident;
                let cfgs = &v.cfgs;
                quote! { #(#cfgs)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
            })
            .collect();

        let body = if arms.is_empty() {
            quote! { let _ = context; self }
        } else {
            quote! {
                self.map_err(|mut err| {
                    match &mut err {
                        #(#arms)*
                        #[allow(unreachable_patterns)]
                        _ => {},
                    }
                    err
                })
            }
        };

        quote! {
            /// Attaches a human-readable context to an error on its way up.
            #vis trait #ext<T> {
                fn context(
                    self,
                    context: impl Into<std::borrow::Cow<'static, str>>,
                ) -> std::result::Result<T, #name>;
            }

            #[automatically_derived]
            impl<T> #ext<T> for std::result::Result<T, #name> {
                #[inline]
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                    #body
                }
            }
        }
    }

    fn source_conversions(&self) -> TokenStream {
        let name = self.name;
        let ext = &self.ext;

        let impls = self.variants.iter().filter(|v| !v.is_internal()).filter_map(|v| {
            let (field, ty) = v.source?;
            let ident = v.ident;
            let cfgs = &v.cfgs;
            Some(quote! {
                #(#cfgs)*
                #[automatically_derived]
                impl From<#ty> for #name {
                    #[inline]
                    fn from(#field: #ty) -> Self {
                        Self::#ident { #field, context: None }
                    }
                }

                #(#cfgs)*
                #[automatically_derived]
                impl<T> #ext<T> for std::result::Result<T, #ty> {
                    #[inline]
                    fn context(
                        self,
                        context: impl Into<std::borrow::Cow<'static, str>>,
                    ) -> std::result::Result<T, #name> {
                        self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
                    }
                }
            })
        });

        quote! { #(#impls)* }
    }

    fn message_conversions(&self) -> TokenStream {
        let Some(internal) =
            self.variants.iter().find(|v| v.is_internal() && v.has_message && v.has_context)
        else {
            return TokenStream::new();
        };
        let name = self.name;
        let cfgs = &internal.cfgs;

        quote! {
            #(#cfgs)*
            #[automatically_derived]
            impl From<&'static str> for #name {
                #[inline]
                fn from(message: &'static str) -> Self {
                    Self::Internal { message: std::borrow::Cow::Borrowed(message), context: None }
                }
            }

            #(#cfgs)*
            #[automatically_derived]
            impl From<String> for #name {
                #[inline]
                fn from(message: String) -> Self {
                    Self::Internal { message: std::borrow::Cow::Owned(message), context: None }
                }
            }
        }
    }
}

fn is_source(ident: &Ident, field: &Field) -> bool {
    ident == "source"
        || field.attrs.iter().any(|attr| attr.path().is_ident("source") || attr.path().is_ident("from"))
}

fn missing_derives(attrs: &[Attribute]) -> TokenStream {
    let mut present = FxHashSet::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(last) = meta.path.segments.last() {
                present.insert(last.ident.to_string());
            }
            Ok(())
        });
    }

    let mut derives = Vec::new();
    if !present.contains("Debug") {
        derives.push(quote! { Debug });
    }
    if !present.contains("Error") {
        derives.push(quote! { ::thiserror::Error });
    }

    if derives.is_empty() { TokenStream::new() } else { quote! { #[derive(#(#derives),*)] } }
}

/// Matches `Option<Cow<'static, str>>` written with any path prefix.
fn is_optional_cow(ty: &Type) -> bool {
    let Some(inner) = single_generic(ty, "Option") else {
        return false;
    };
    let Type::Path(path) = inner else {
        return false;
    };
    let Some(cow) = path.path.segments.last().filter(|seg| seg.ident == "Cow") else {
        return false;
    };
    let PathArguments::AngleBracketed(args) = &cow.arguments else {
        return false;
    };

    let mut args = args.args.iter();
    let lifetime_ok =
        matches!(args.next(), Some(GenericArgument::Lifetime(lt)) if lt.ident == "static");
    let target_ok = matches!(
        args.next(),
        Some(GenericArgument::Type(Type::Path(p)))
            if p.path.segments.last().is_some_and(|seg| seg.ident == "str")
    );

    lifetime_ok && target_ok
}

fn single_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
