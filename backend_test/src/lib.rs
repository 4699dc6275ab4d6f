use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one, inject dependencies,
/// and give every test a fresh in-memory store.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::store::Storage`, the same store the client's server uses.
///
/// `#[backend_test(admin)]` logs the client in as admin before the test runs.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the parameters to inject and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Log in the client as admin if needed.
    let maybe_login = match parse_macro_input!(args as Option<Ident>) {
        Some(arg) if arg == "admin" => quote! {
            crate::test_support::login_admin(&rocket_client).await;
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `admin` or nothing")
                .into_compile_error()
                .into();
        }
        None => quote! {},
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            // This test enters backend code, so enable logging.
            log4rs_test_utils::test_logging::init_logging_once_for(
                ["assembleia_backend"],
                None,
                None,
            );

            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, crate::store::Storage) {
                let storage = crate::store::Storage::memory();
                let rocket = crate::build_with_storage(crate::test_support::figment(), storage.clone());
                let rocket_client = rocket::local::asynchronous::Client::tracked(rocket)
                    .await
                    .unwrap();

                #maybe_login

                (rocket_client, storage)
            }

            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                #[allow(unused_variables)]
                let (rocket_client, storage) = setup().await;
                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_storage = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    if let Some(type_ident) = type_path.path.get_ident() {
                        if type_ident == "Client" {
                            if has_client {
                                return Err(syn::Error::new(input.span(), "Test cannot accept more than one `rocket::local::asynchronous::Client`"));
                            }
                            has_client = true;
                            args.push(quote! { rocket_client });
                            continue;
                        } else if type_ident == "Storage" {
                            if has_storage {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `Storage`",
                                ));
                            }
                            has_storage = true;
                            args.push(quote! { storage });
                            continue;
                        }
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `storage_ident: Storage`",
        ));
    }

    Ok(args)
}
