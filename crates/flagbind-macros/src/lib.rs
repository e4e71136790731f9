use std::collections::HashMap;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, PathArguments,
    Result, Type, ext::IdentExt, parse_macro_input, spanned::Spanned,
};

/// Generate `flagbind::Flags` for a struct with named fields.
///
/// Field attributes:
/// - `#[flag("s,string")]`: comma-separated aliases, the first one is canonical.
/// - `#[env("NAME")]`: environment variable suffix, prefixed by the parser.
///
/// A field of type `Vec<T>` is repeatable. Fields with neither attribute are
/// left alone.
///
/// The struct-level `#[flags(validate, args, set_flags, flags_count)]`
/// attribute exposes the optional capabilities; each one named requires the
/// matching trait impl (`Validate`, `SetArgs`, `SetFlags`, `SetFlagsCount`).
///
/// ```ignore
/// #[derive(Default, flagbind::Flags)]
/// #[flags(validate)]
/// struct Cmd {
///     #[flag("h,help")]
///     help: bool,
///     #[flag("addr")]
///     #[env("ADDR")]
///     addr: String,
///     #[flag("i,include")]
///     include: Vec<String>,
/// }
/// ```
#[proc_macro_derive(Flags, attributes(flag, env, flags))]
pub fn derive_flags(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_flags(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct Capabilities {
    validate: bool,
    args: bool,
    set_flags: bool,
    flags_count: bool,
}

struct BoundField {
    ident: Ident,
    aliases: Option<LitStr>,
    env: Option<LitStr>,
    repeated: bool,
}

fn expand_flags(input: DeriveInput) -> Result<proc_macro2::TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Flags needs a struct with named fields, found a unit struct",
                ));
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Flags needs a struct with named fields, found a tuple struct",
                ));
            }
        },
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "Flags can only be derived for structs",
            ));
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "Flags can only be derived for structs",
            ));
        }
    };

    let caps = parse_capabilities(&input.attrs)?;

    let mut bound = Vec::new();
    for field in fields {
        if let Some(field) = parse_field(field)? {
            bound.push(field);
        }
    }
    check_duplicate_aliases(&bound)?;

    let registrations = bound.iter().map(|field| {
        let ident = &field.ident;
        let name = LitStr::new(&ident.unraw().to_string(), ident.span());
        let aliases = field.aliases.as_ref().map(|lit| quote! { .flags(#lit) });
        let env = field.env.as_ref().map(|lit| quote! { .env(#lit) });
        let method = if field.repeated {
            quote!(repeated)
        } else {
            quote!(scalar)
        };
        quote! {
            registry.#method(
                ::flagbind::FieldMeta::new(#name) #aliases #env,
                &mut self.#ident,
            );
        }
    });

    let mut accessors = Vec::new();
    if caps.validate {
        accessors.push(quote! {
            fn as_validate(&self) -> ::core::option::Option<&dyn ::flagbind::Validate> {
                ::core::option::Option::Some(self)
            }
        });
    }
    if caps.args {
        accessors.push(quote! {
            fn as_set_args(&mut self) -> ::core::option::Option<&mut dyn ::flagbind::SetArgs> {
                ::core::option::Option::Some(self)
            }
        });
    }
    if caps.set_flags {
        accessors.push(quote! {
            fn as_set_flags(&mut self) -> ::core::option::Option<&mut dyn ::flagbind::SetFlags> {
                ::core::option::Option::Some(self)
            }
        });
    }
    if caps.flags_count {
        accessors.push(quote! {
            fn as_set_flags_count(
                &mut self,
            ) -> ::core::option::Option<&mut dyn ::flagbind::SetFlagsCount> {
                ::core::option::Option::Some(self)
            }
        });
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::flagbind::Flags for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn register<'__flagbind>(
                &'__flagbind mut self,
                registry: &mut ::flagbind::Registry<'__flagbind>,
            ) {
                #(#registrations)*
            }

            #(#accessors)*
        }
    })
}

fn parse_capabilities(attrs: &[Attribute]) -> Result<Capabilities> {
    let mut caps = Capabilities::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("flags")) {
        attr.parse_nested_meta(|meta| {
            let slot = if meta.path.is_ident("validate") {
                &mut caps.validate
            } else if meta.path.is_ident("args") {
                &mut caps.args
            } else if meta.path.is_ident("set_flags") {
                &mut caps.set_flags
            } else if meta.path.is_ident("flags_count") {
                &mut caps.flags_count
            } else {
                return Err(meta.error(
                    "unknown capability, expected one of: validate, args, set_flags, flags_count",
                ));
            };
            if *slot {
                return Err(meta.error("capability listed twice"));
            }
            *slot = true;
            Ok(())
        })?;
    }

    Ok(caps)
}

fn parse_field(field: &Field) -> Result<Option<BoundField>> {
    let mut aliases: Option<LitStr> = None;
    let mut env: Option<LitStr> = None;

    for attr in &field.attrs {
        let (slot, what) = if attr.path().is_ident("flag") {
            (&mut aliases, "flag")
        } else if attr.path().is_ident("env") {
            (&mut env, "env")
        } else {
            continue;
        };

        if slot.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                format!("duplicate #[{what}] attribute"),
            ));
        }
        let lit: LitStr = attr.parse_args()?;
        let empty = match what {
            "flag" => lit.value().split(',').all(|alias| alias.trim().is_empty()),
            _ => lit.value().trim().is_empty(),
        };
        if empty {
            return Err(syn::Error::new(
                lit.span(),
                format!("#[{what}] needs a non-empty name"),
            ));
        }
        *slot = Some(lit);
    }

    if aliases.is_none() && env.is_none() {
        return Ok(None);
    }

    // Named fields always carry an ident.
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new(field.span(), "expected a named field"));
    };

    Ok(Some(BoundField {
        ident,
        aliases,
        env,
        repeated: vec_element(&field.ty).is_some(),
    }))
}

fn check_duplicate_aliases(fields: &[BoundField]) -> Result<()> {
    let mut seen: HashMap<String, &Ident> = HashMap::new();

    for field in fields {
        let Some(lit) = &field.aliases else {
            continue;
        };
        for alias in lit.value().split(',').map(str::trim) {
            if alias.is_empty() {
                continue;
            }
            if let Some(previous) = seen.insert(alias.to_owned(), &field.ident) {
                return Err(syn::Error::new(
                    lit.span(),
                    format!("flag redefined: {alias} (already declared on field `{previous}`)"),
                ));
            }
        }
    }

    Ok(())
}

/// The `T` of a `Vec<T>` field type, matched by path.
fn vec_element(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Vec" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}
