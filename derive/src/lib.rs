extern crate proc_macro;

use itertools::izip;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use std::collections::HashSet;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Type};

/// Field attributes parsed from `#[hessian(...)]` annotations
///
/// * `rename` - Field name written into the class definition instead of the Rust identifier
/// * `default` - Use `Default::default()` when the decoded definition lacks the field
/// * `skip` - Never encoded, always decoded as `Default::default()`
#[derive(Debug, Clone, Default)]
struct FieldAttributes {
    rename: Option<String>,
    default: bool,
    skip: bool,
}

/// Parses `#[hessian(rename = "name", default, skip)]` on a field.
fn get_field_attributes(attrs: &[Attribute]) -> syn::Result<FieldAttributes> {
    let mut out = FieldAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("hessian") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<Ident>()?;
                if ident == "rename" {
                    input.parse::<syn::Token![=]>()?;
                    out.rename = Some(input.parse::<LitStr>()?.value());
                } else if ident == "default" {
                    out.default = true;
                } else if ident == "skip" {
                    out.skip = true;
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown attribute: {}", ident),
                    ));
                }

                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(out)
}

/// Parses `#[hessian(class = "com.example.Type")]` on the struct.
fn get_class_name(attrs: &[Attribute], default: &Ident) -> syn::Result<String> {
    let mut class = None;
    for attr in attrs {
        if !attr.path().is_ident("hessian") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            let ident = input.parse::<Ident>()?;
            if ident != "class" {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("Unknown attribute: {}", ident),
                ));
            }
            input.parse::<syn::Token![=]>()?;
            class = Some(input.parse::<LitStr>()?.value());
            Ok(())
        })?;
    }
    Ok(class.unwrap_or_else(|| default.to_string()))
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map_or(false, |seg| seg.ident == "Option")
    } else {
        false
    }
}

struct ClassField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    wire_name: String,
    attrs: FieldAttributes,
}

/// Collects the named fields of a struct along with their wire names.
fn class_fields(input: &DeriveInput) -> syn::Result<Vec<ClassField<'_>>> {
    let fields = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(fields) => fields,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Only structs with named fields map onto Hessian2 class instances",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Only structs with named fields map onto Hessian2 class instances",
            ))
        }
    };

    let mut used_names = HashSet::new();
    let mut out = Vec::new();
    for f in &fields.named {
        let Some(ident) = f.ident.as_ref() else {
            continue;
        };
        let attrs = get_field_attributes(&f.attrs)?;
        let wire_name = attrs.rename.clone().unwrap_or_else(|| ident.to_string());
        if !attrs.skip && !used_names.insert(wire_name.clone()) {
            return Err(syn::Error::new_spanned(
                ident,
                format!(
                    "Field name '{}' is duplicated for struct '{}'. Use #[hessian(rename = \"...\")] to pick another.",
                    wire_name, input.ident
                ),
            ));
        }
        out.push(ClassField {
            ident,
            ty: &f.ty,
            wire_name,
            attrs,
        });
    }
    Ok(out)
}

/// Derive macro for implementing the `ToHessian` trait
///
/// The struct is written as a class instance. Its definition (class name plus wire
/// field names, in declaration order) is emitted once per encoding session.
///
/// # Supported Attributes
///
/// * `#[hessian(class = "...")]` - Class name, defaults to the struct name
/// * `#[hessian(rename = "...")]` - Wire name of a field
/// * `#[hessian(skip)]` - Leave a field out of the definition
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(ToHessian)]
/// #[hessian(class = "com.example.User")]
/// struct User {
///     #[hessian(rename = "userName")]
///     user_name: String,
///     #[hessian(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(ToHessian, attributes(hessian))]
pub fn derive_to_hessian(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_to_hessian(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_to_hessian(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let class = get_class_name(&input.attrs, name)?;
    let fields: Vec<_> = class_fields(input)?
        .into_iter()
        .filter(|f| !f.attrs.skip)
        .collect();

    let wire_names = fields.iter().map(|f| &f.wire_name);
    let field_encode = fields.iter().map(|f| {
        let ident = f.ident;
        quote! {
            hessian2_codec::ToHessian::to_hessian(&self.#ident, encoder)?;
        }
    });

    Ok(quote! {
        impl #impl_generics hessian2_codec::ToHessian for #name #ty_generics #where_clause {
            fn to_hessian(&self, encoder: &mut hessian2_codec::Encoder) -> hessian2_codec::Result<()> {
                static DEFINITION: std::sync::OnceLock<hessian2_codec::Definition> =
                    std::sync::OnceLock::new();
                let definition = DEFINITION.get_or_init(|| {
                    hessian2_codec::Definition::new(
                        #class,
                        vec![#( #wire_names.to_string() ),*],
                    )
                });
                encoder.encode_class_instance_begin(definition)?;
                encoder.nested(|encoder| {
                    #( #field_encode )*
                    Ok(())
                })?;
                encoder.encode_class_instance_end()
            }
        }
    })
}

/// Derive macro for implementing the `FromHessian` trait
///
/// Accepts any class-instance form. Wire fields are matched to struct fields by name,
/// in whatever order the decoded definition lists them; wire fields with no matching
/// struct field are read and discarded.
///
/// # Supported Attributes
///
/// * `#[hessian(rename = "...")]` - Wire name of a field
/// * `#[hessian(default)]` - Use `Default::default()` if the field is missing
/// * `#[hessian(skip)]` - Always `Default::default()`
///
/// `Option<T>` fields default to `None` when missing.
#[proc_macro_derive(FromHessian, attributes(hessian))]
pub fn derive_from_hessian(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_from_hessian(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_from_hessian(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    // Validates the container attribute even though decoding accepts any class name.
    get_class_name(&input.attrs, name)?;
    let fields = class_fields(input)?;

    let idents: Vec<_> = fields.iter().map(|f| f.ident).collect();
    let types: Vec<_> = fields.iter().map(|f| f.ty).collect();
    let locals: Vec<_> = idents.iter().map(|i| format_ident!("value_{}", i)).collect();

    let mut local_definitions = Vec::new();
    let mut match_arms = Vec::new();
    let mut struct_assignments = Vec::new();
    for (ident, ty, local, field) in izip!(idents.iter(), types.iter(), locals.iter(), fields.iter())
    {
        if field.attrs.skip {
            struct_assignments.push(quote! { #ident: Default::default(), });
            continue;
        }
        let wire_name = &field.wire_name;
        local_definitions.push(quote! { let mut #local: Option<#ty> = None; });
        match_arms.push(quote! {
            #wire_name => {
                #local = Some(<#ty as hessian2_codec::FromHessian>::from_hessian(decoder)?);
            }
        });
        if field.attrs.default || is_option_type(ty) {
            struct_assignments.push(quote! {
                #ident: #local.unwrap_or_default(),
            });
        } else {
            struct_assignments.push(quote! {
                #ident: #local.ok_or(
                    hessian2_codec::StructDecodeError::MissingRequiredField {
                        field: #wire_name,
                        struct_name: stringify!(#name),
                    }
                )?,
            });
        }
    }

    Ok(quote! {
        impl #impl_generics hessian2_codec::FromHessian for #name #ty_generics #where_clause {
            fn from_hessian(decoder: &mut hessian2_codec::Decoder) -> hessian2_codec::Result<Self> {
                let definition = decoder.decode_class_instance_begin()?;
                #( #local_definitions )*
                decoder.nested(|decoder| {
                    for wire_field in definition.field_names.iter() {
                        match wire_field.as_str() {
                            #( #match_arms )*
                            _ => decoder.skip_value()?,
                        }
                    }
                    Ok(())
                })?;
                decoder.decode_class_instance_end()?;

                Ok(#name {
                    #( #struct_assignments )*
                })
            }
        }
    })
}
