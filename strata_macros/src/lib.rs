use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Error, Fields, ItemEnum};

/// Derives `strata_utils::ShaderUniformIndex` for a `#[repr(u8)]` enum.
///
/// Every variant is one binding of the uniform bind group, numbered by its
/// discriminant. Variants must not carry data.
#[proc_macro_derive(UniformIndex)]
pub fn uniform_index(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as ItemEnum);

    expand(&input).unwrap_or_else(|e| e.to_compile_error().into())
}

fn expand(input: &ItemEnum) -> syn::Result<TokenStream> {
    if input.variants.is_empty() {
        return Err(Error::new(
            input.span(),
            "a uniform index needs at least one binding",
        ));
    }

    if let Some(variant) = input
        .variants
        .iter()
        .find(|variant| !matches!(variant.fields, Fields::Unit))
    {
        return Err(Error::new(
            variant.span(),
            "uniform index variants name a binding and cannot hold data",
        ));
    }

    let ident = &input.ident;
    let display_name = ident
        .to_string()
        .replace("Uniform", "")
        .replace("Index", "");
    let max = input.variants.len() - 1;

    let arms = input.variants.iter().map(|variant| {
        let name = &variant.ident;
        quote! { index if index == #ident::#name as usize => Some(#ident::#name), }
    });

    Ok(quote! {
        impl ::strata_utils::ShaderUniformIndex for #ident {
            const MAX: usize = #max;

            #[inline]
            fn index(&self) -> usize {
                *self as usize
            }

            fn by_index(index: usize) -> Option<Self> {
                match index {
                    #(#arms)*
                    _ => None,
                }
            }

            #[inline]
            fn name() -> &'static str {
                #display_name
            }
        }
    }
    .into())
}
