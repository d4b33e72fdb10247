//! Derive macros for morphogen.
//!
//! This crate provides one derive macro:
//!
//! - [`ModelParams`] - Turns a struct of `f32` fields into a typed parameter block
//!
//! # Usage
//!
//! The macro is re-exported from the main `morphogen` crate. You don't need
//! to add this crate directly:
//!
//! ```ignore
//! use morphogen::prelude::*;
//!
//! #[derive(ModelParams, Clone, Copy, Debug)]
//! struct GrayScott {
//!     #[param(label = "Feed Rate (f)", min = 0.0, max = 0.1, default = 0.055, step = 0.001)]
//!     feed: f32,
//!     #[param(id = "Du", label = "Diffusion U", min = 0.05, max = 0.5, default = 0.2097, step = 0.001)]
//!     du: f32,
//! }
//! ```
//!
//! # Generated Items
//!
//! - `impl ModelParams` with:
//!   - a `PARAMS` descriptor table in field order (id, label, bounds, default, step)
//!   - `from_set` / `to_set` conversions against a `ParameterSet`
//!   - `gpu_words()` packing the fields into eight `f32` slots for a uniform buffer
//!   - `WGSL_BINDINGS`, a block of `let` statements that unpack those slots
//!     inside a compute shader under the field names
//! - `impl Default` using each field's declared default

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Expr, Fields, LitStr, Type};

/// Maximum number of parameters that fit in the packed uniform block
/// (`array<vec4<f32>, 2>` on the shader side).
const MAX_GPU_PARAMS: usize = 8;

/// Parsed contents of a `#[param(...)]` attribute.
struct ParamAttr {
    id: Option<LitStr>,
    label: Option<LitStr>,
    min: Option<Expr>,
    max: Option<Expr>,
    default: Option<Expr>,
    step: Option<Expr>,
}

impl ParamAttr {
    fn parse(attr: &syn::Attribute) -> syn::Result<Self> {
        let mut parsed = ParamAttr {
            id: None,
            label: None,
            min: None,
            max: None,
            default: None,
            step: None,
        };

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                parsed.id = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("label") {
                parsed.label = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("min") {
                parsed.min = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("max") {
                parsed.max = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("default") {
                parsed.default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("step") {
                parsed.step = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unknown param key, expected one of: id, label, min, max, default, step"));
            }
            Ok(())
        })?;

        Ok(parsed)
    }
}

/// Derive macro for model parameter blocks.
///
/// Every field must be an `f32` carrying a `#[param(...)]` attribute with
/// `label`, `min`, `max` and `default`. `step` defaults to `0.01` and `id`
/// defaults to the field name.
///
/// # Example
///
/// ```ignore
/// #[derive(ModelParams, Clone, Copy, Debug)]
/// struct Brusselator {
///     #[param(id = "A", label = "A (feed)", min = 0.5, max = 5.0, default = 1.0, step = 0.1)]
///     a: f32,
///     #[param(id = "B", label = "B (control)", min = 1.0, max = 5.0, default = 3.0, step = 0.1)]
///     b: f32,
/// }
///
/// let p = Brusselator::default();
/// assert_eq!(Brusselator::PARAMS[1].id, "B");
/// assert_eq!(p.gpu_words()[1], 3.0);
/// ```
///
/// The generated `WGSL_BINDINGS` for the struct above reads:
///
/// ```text
///     let a = sim.params[0].x;
///     let b = sim.params[0].y;
/// ```
///
/// # Panics
///
/// The macro panics at compile time if:
/// - Applied to anything but a struct with named fields
/// - A field is not `f32` or lacks a `#[param]` attribute
/// - A required key (`label`, `min`, `max`, `default`) is missing
/// - The struct has more than eight fields
#[proc_macro_derive(ModelParams, attributes(param))]
pub fn derive_model_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("ModelParams derive only supports structs with named fields"),
        },
        _ => panic!("ModelParams derive only supports structs"),
    };

    if fields.len() > MAX_GPU_PARAMS {
        panic!(
            "ModelParams struct '{}' has {} fields, at most {} fit in the GPU parameter block",
            name,
            fields.len(),
            MAX_GPU_PARAMS
        );
    }

    let mut descriptors = Vec::new();
    let mut from_set_fields = Vec::new();
    let mut to_set_inserts = Vec::new();
    let mut gpu_writes = Vec::new();
    let mut default_fields = Vec::new();
    let mut wgsl_lines = String::new();

    for (index, field) in fields.iter().enumerate() {
        let field_name = field.ident.as_ref().unwrap();
        let field_str = field_name.to_string();

        match &field.ty {
            Type::Path(type_path) if type_path.path.is_ident("f32") => {}
            _ => panic!(
                "ModelParams field '{}' must be f32",
                field_str
            ),
        }

        let attr = field
            .attrs
            .iter()
            .find(|a| a.path().is_ident("param"))
            .unwrap_or_else(|| panic!("ModelParams field '{}' needs a #[param(...)] attribute", field_str));

        let parsed = match ParamAttr::parse(attr) {
            Ok(parsed) => parsed,
            Err(err) => return err.to_compile_error().into(),
        };

        let id = parsed
            .id
            .unwrap_or_else(|| LitStr::new(&field_str, Span::call_site()));
        let label = parsed
            .label
            .unwrap_or_else(|| panic!("ModelParams field '{}' is missing `label`", field_str));
        let min = parsed
            .min
            .unwrap_or_else(|| panic!("ModelParams field '{}' is missing `min`", field_str));
        let max = parsed
            .max
            .unwrap_or_else(|| panic!("ModelParams field '{}' is missing `max`", field_str));
        let default = parsed
            .default
            .unwrap_or_else(|| panic!("ModelParams field '{}' is missing `default`", field_str));
        let step = match parsed.step {
            Some(step) => quote! { (#step) as f32 },
            None => quote! { 0.01 },
        };

        descriptors.push(quote! {
            morphogen::params::ParamDef {
                id: #id,
                label: #label,
                min: (#min) as f32,
                max: (#max) as f32,
                default: (#default) as f32,
                step: #step,
            }
        });

        from_set_fields.push(quote! {
            #field_name: set.get(#id).unwrap_or((#default) as f32)
        });

        to_set_inserts.push(quote! {
            set.insert(#id, self.#field_name);
        });

        gpu_writes.push(quote! {
            words[#index] = self.#field_name;
        });

        default_fields.push(quote! {
            #field_name: (#default) as f32
        });

        let component = ["x", "y", "z", "w"][index % 4];
        wgsl_lines.push_str(&format!(
            "    let {} = sim.params[{}].{};\n",
            field_str,
            index / 4,
            component
        ));
    }

    let expanded = quote! {
        impl morphogen::params::ModelParams for #name {
            const PARAMS: &'static [morphogen::params::ParamDef] = &[
                #(#descriptors),*
            ];

            const WGSL_BINDINGS: &'static str = #wgsl_lines;

            fn from_set(set: &morphogen::params::ParameterSet) -> Self {
                Self {
                    #(#from_set_fields),*
                }
            }

            fn to_set(&self) -> morphogen::params::ParameterSet {
                let mut set = morphogen::params::ParameterSet::new();
                #(#to_set_inserts)*
                set
            }

            fn gpu_words(&self) -> [f32; 8] {
                let mut words = [0.0f32; 8];
                #(#gpu_writes)*
                words
            }
        }

        impl Default for #name {
            fn default() -> Self {
                Self {
                    #(#default_fields),*
                }
            }
        }
    };

    TokenStream::from(expanded)
}
