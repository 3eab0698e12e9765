use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, ItemStruct, parse_macro_input, parse_quote};

use dtogen::generate::ConversionSynthesizer;
use dtogen::parse::{ModelDeclaration, ModelDescriptor, Namespace};
use dtogen::utils::attributes::strip_struct_markers;

/// Marks a struct as a model type that gets a generated transfer type.
///
/// The DTO itself is written by the build script (see `dtogen::generate_from_dir`);
/// this attribute checks the declaration where it is written, so mistakes show
/// up as compile errors on the offending tokens, and removes the member-level
/// markers the compiler would otherwise reject.
///
/// # Arguments
///
/// - `name = "[class]Dto"` - name template, `[class]` is replaced by the model name
/// - `conversion = Explicit | StaticMethods` - which conversions to generate
///
/// Both may be given positionally, in that order.
///
/// # Member markers
///
/// - `#[dto_ignore]` - leave the member out of the DTO
/// - `#[has_conversion(Implicit, "AddressDto")]` - change the member's type in the DTO
/// - `#[has_indirect_conversion("tag_to_dto", "TagDto")]` - convert through a method
/// - `#[has_indirect_conversion(TagConverter, "convert", "TagDto")]` - convert through a converter type
///
/// # Example
///
/// ```
/// use dtogen_macros::has_dto;
///
/// #[has_dto(name = "[class]Dto", conversion = StaticMethods)]
/// #[derive(Debug, Clone)]
/// pub struct User {
///     pub id: u64,
///     pub name: String,
///     #[dto_ignore]
///     pub password_hash: String,
/// }
///
/// let user = User { id: 1, name: "ada".into(), password_hash: String::new() };
/// assert_eq!(user.id, 1);
/// ```
#[proc_macro_attribute]
pub fn has_dto(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item = parse_macro_input!(input as ItemStruct);
    let args = TokenStream2::from(args);

    let marker: Attribute = if args.is_empty() {
        parse_quote!(#[has_dto])
    } else {
        parse_quote!(#[has_dto(#args)])
    };
    item.attrs.insert(0, marker);

    let errors = validate(&item);
    strip_struct_markers(&mut item);

    match errors {
        Ok(()) => quote!(#item).into(),
        Err(error) => {
            let error = error.to_compile_error();
            quote! {
                #error
                #item
            }
            .into()
        }
    }
}

fn validate(item: &ItemStruct) -> syn::Result<()> {
    // The module path is only known to the build script
    let declaration = ModelDeclaration::new(item.clone(), Namespace::global());
    let descriptor = ModelDescriptor::build(&declaration).map_err(|e| e.to_syn_error())?;
    ConversionSynthesizer::default()
        .synthesize(&descriptor)
        .map_err(|e| e.to_syn_error())?;
    Ok(())
}
