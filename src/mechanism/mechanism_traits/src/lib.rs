use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};


/// Derive macro to automatically implement `NamedVariables` for a struct of named
/// `f64` fields, variables are exposed in field declaration order under the field name
#[proc_macro_derive(NamedVariables)]
pub fn derive_named_variables(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    // Get the name of the struct we are deriving the trait for
    let name = input.ident;

    let fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "NamedVariables can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(
                name,
                "NamedVariables can only be derived for structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let idents: Vec<_> = fields.iter()
        .filter_map(|field| field.ident.clone())
        .collect();
    let names: Vec<String> = idents.iter()
        .map(|ident| ident.to_string())
        .collect();

    // Generate the implementation of the trait
    let expanded = quote! {
        impl NamedVariables for #name {
            fn variable_names() -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn variable_values(&self) -> Vec<f64> {
                vec![#(self.#idents),*]
            }

            fn get_variable(&self, name: &str) -> Option<f64> {
                match name {
                    #(#names => Some(self.#idents),)*
                    _ => None,
                }
            }
        }
    };

    TokenStream::from(expanded)
}
