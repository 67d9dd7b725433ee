//! Derive support for the type-graph arena used by `emitgraph-fixtures`.
//!
//! The engine dispatches on the *kind* of a type-graph node: every variant of
//! the `Type` enum needs a matching, fieldless `Kind` discriminant. Hand
//! maintaining two parallel enums invites drift, so `#[derive(NodeKind)]`
//! generates the discriminant enum and a `kind()` accessor from a single
//! source of truth.

extern crate proc_macro;
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

#[proc_macro_derive(NodeKind)]
pub fn derive_node_kind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let enum_name = &input.ident;
    let kind_name = syn::Ident::new(&format!("{enum_name}Kind"), enum_name.span());

    let Data::Enum(data) = &input.data else {
        return syn::Error::new_spanned(&input, "NodeKind can only be derived for enums")
            .to_compile_error()
            .into();
    };

    let variant_idents: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();

    let kind_variants = variant_idents.iter().map(|ident| quote!(#ident));
    let match_arms = data.variants.iter().map(|variant| {
        let ident = &variant.ident;
        let pattern = match &variant.fields {
            Fields::Unit => quote!(#enum_name::#ident),
            Fields::Unnamed(_) => quote!(#enum_name::#ident(..)),
            Fields::Named(_) => quote!(#enum_name::#ident { .. }),
        };
        quote!(#pattern => #kind_name::#ident)
    });

    let expanded = quote! {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub enum #kind_name {
            #(#kind_variants),*
        }

        impl #enum_name {
            /// Returns the fieldless discriminant of this node, used to
            /// derive the operation key in the dispatch table.
            #[must_use]
            pub fn kind(&self) -> #kind_name {
                match self {
                    #(#match_arms),*
                }
            }
        }
    };
    expanded.into()
}
