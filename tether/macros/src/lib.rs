//! Proc-macros for `tether`:
//! - `Initialize`
#![recursion_limit = "256"]
extern crate proc_macro;
use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, TokenStreamExt};

mod initialize;

//--------------------------------------------------------------------------------------------------
struct CrateName;
const CRATE: CrateName = CrateName;

impl ToTokens for CrateName {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append(syn::Ident::new("tether", Span::call_site()))
    }
}

//--------------------------------------------------------------------------------------------------
/// Derives `Initialize` for a struct by initializing its fields in declaration order.
///
/// Field attributes:
/// - `#[init(skip)]`: the field is neither initialized nor checked.
/// - `#[init(name = "...")]`: name of the field in error reports.
#[proc_macro_derive(Initialize, attributes(init))]
pub fn initialize_derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let derive_input = syn::parse_macro_input!(input as syn::DeriveInput);
    match initialize::derive(&derive_input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into(),
    }
}
