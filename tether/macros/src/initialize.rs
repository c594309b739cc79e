use crate::CRATE;
use darling::{util::Flag, FromField};
use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;

#[derive(FromField)]
#[darling(attributes(init))]
struct InitField {
    ident: Option<syn::Ident>,
    #[darling(default)]
    skip: Flag,
    #[darling(default)]
    name: Option<String>,
}

/// Returns the generated impl, or the tokens of the compile errors.
pub fn derive(input: &syn::DeriveInput) -> Result<TokenStream, TokenStream> {
    let fields = match input.data {
        syn::Data::Struct(ref s) => &s.fields,
        _ => {
            return Err(
                syn::Error::new(input.span(), "`Initialize` can only be derived for struct types").to_compile_error(),
            )
        }
    };

    let struct_name = &input.ident;
    let struct_name_str = struct_name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut init_stmts = Vec::new();
    let mut is_init_exprs = Vec::new();
    let mut errors = Vec::new();
    // position in initialization order; skipped fields don't count
    let mut position = 0usize;

    for (index, field) in fields.iter().enumerate() {
        let attr = match <InitField as FromField>::from_field(field) {
            Ok(attr) => attr,
            Err(e) => {
                errors.push(e.write_errors());
                continue;
            }
        };
        if attr.skip.is_some() {
            continue;
        }

        let member = match attr.ident {
            Some(ref ident) => syn::Member::Named(ident.clone()),
            None => syn::Member::Unnamed(syn::Index {
                index: index as u32,
                span: field.span(),
            }),
        };
        let label = match (&attr.name, &attr.ident) {
            (Some(name), _) => name.clone(),
            (None, Some(ident)) => ident.to_string(),
            (None, None) => index.to_string(),
        };

        init_stmts.push(quote! {
            if !#CRATE::Initialize::is_initialized(&self.#member) {
                #CRATE::Initialize::initialize(&mut self.#member, gl).map_err(|err| {
                    #CRATE::derive_helpers::element_failed(#position, ::std::borrow::Cow::Borrowed(#label), err)
                })?;
            }
        });
        is_init_exprs.push(quote! {
            #CRATE::Initialize::is_initialized(&self.#member)
        });
        position += 1;
    }

    if !errors.is_empty() {
        return Err(quote! { #(#errors)* });
    }

    Ok(quote! {
        impl #impl_generics #CRATE::Initialize for #struct_name #ty_generics #where_clause {
            fn initialize(&mut self, gl: &#CRATE::Context) -> #CRATE::Result<()> {
                #(#init_stmts)*
                Ok(())
            }

            fn is_initialized(&self) -> bool {
                true #(&& #is_init_exprs)*
            }

            fn describe(&self) -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#struct_name_str)
            }
        }
    })
}
