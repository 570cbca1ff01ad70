use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use quote::quote_spanned;
use syn::spanned::Spanned;

/// Turns `async fn name(provider: MockProviderHandle)` into a `#[test]` that runs it against a
/// mock provider built from `pact_fn()`, optionally adjusting the configuration with
/// `configure_fn(&mut MockProviderConfig)` first. The test panics unless every request matched.
#[proc_macro_attribute]
pub fn pact_consumer_test(attrs: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemFn);
    let args = syn::parse_macro_input!(attrs as syn::AttributeArgs);

    if args.is_empty() || args.len() > 2 {
        return quote! {
            compile_error!("A pact function and an optional configuration function should be passed to the macro");
        }
        .into();
    }

    let pact_function = match function_path(&args[0]) {
        Ok(path) => path,
        Err(stream) => return stream.into(),
    };

    let configure_call = match args.get(1).map(function_path) {
        Some(Ok(path)) => quote! { #path(&mut __pact_configuration); },
        Some(Err(stream)) => return stream.into(),
        None => quote! {},
    };

    if let Err(stream) = validate_signature(&input.sig) {
        return stream.into();
    }

    let name = &input.sig.ident;
    let attributes = &input.attrs;
    let mut body = input.clone();
    body.attrs.clear();
    body.vis = syn::Visibility::Inherited;
    body.sig.ident = syn::Ident::new("__pact_consumer_test_body", Span::call_site());

    let output = quote! {
        #[test]
        #(#attributes)*
        fn #name() {
            #body

            let mut __pact_configuration = pact_mock_provider::MockProviderConfig::from_env();
            #configure_call

            match pact_mock_provider::block_on_consumer_test(
                #pact_function(),
                __pact_configuration,
                __pact_consumer_test_body,
            ) {
                Ok(verdict) => {
                    if let Err(verdict) = verdict.into_result() {
                        panic!("Pact verification failed: {}", verdict);
                    }
                }
                Err(e) => panic!("Mock provider error: {}", e),
            }
        }
    };

    TokenStream::from(output)
}

fn function_path(arg: &syn::NestedMeta) -> Result<&syn::Path, proc_macro2::TokenStream> {
    if let syn::NestedMeta::Meta(syn::Meta::Path(path)) = arg {
        Ok(path)
    } else {
        Err(quote_spanned! {arg.span()=>
            compile_error!("Expected a function name!");
        })
    }
}

fn validate_signature(signature: &syn::Signature) -> Result<(), proc_macro2::TokenStream> {
    if signature.asyncness.is_none() {
        return Err(quote_spanned! {signature.fn_token.span=>
            compile_error!("The test function should be async!");
        });
    }

    if signature.inputs.len() != 1 {
        return Err(quote_spanned! {signature.inputs.span()=>
            compile_error!("The test function should take the mock provider handle as its only argument!");
        });
    }

    Ok(())
}
