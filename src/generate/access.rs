//! Member access from the generated module
//!
//! Conversion code lives under the reserved namespace, a sibling of the model's
//! own module. It reads every member of the model and rebuilds it with a struct
//! literal, so every member has to be visible from there.

use syn::{Path, VisRestricted, Visibility};

use crate::config::GeneratorConfig;
use crate::error::{DeclarationErrors, DtoGenError, DtoGenResult, ErrorCollector};
use crate::parse::{ModelDescriptor, ModelMember, Namespace};

/// Checks that conversion code can reach the members of a model.
#[derive(Debug, Clone)]
pub struct AccessChecker {
    /// Reserved namespace below the crate root.
    reserved: Vec<String>,
    /// Models are referenced through `crate`, so restricted visibilities can apply.
    same_crate: bool,
}

impl Default for AccessChecker {
    fn default() -> Self {
        Self {
            reserved: vec!["dto".to_owned()],
            same_crate: true,
        }
    }
}

impl AccessChecker {
    pub fn new(reserved: &Namespace, model_root: &Path) -> Self {
        let same_crate = model_root.leading_colon.is_none()
            && model_root.segments.len() == 1
            && model_root.segments[0].ident == "crate";
        Self {
            reserved: reserved.segments().to_vec(),
            same_crate,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> DtoGenResult<Self> {
        Ok(Self::new(
            &Namespace::parse(&config.reserved_namespace),
            &config.model_root_path()?,
        ))
    }

    /// Module the derived types of `namespace` are generated into.
    pub fn generated_module(&self, namespace: &Namespace) -> Namespace {
        Namespace::new(self.reserved.iter().chain(namespace.segments()))
    }

    /// Reject a model with conversions when any of its members is out of reach.
    ///
    /// A model without conversions is only read for its member types, so it
    /// always passes.
    pub fn check(&self, descriptor: &ModelDescriptor) -> Result<(), DeclarationErrors> {
        let mut errors = ErrorCollector::new(descriptor.model_name.as_str());
        if descriptor.conversion.is_empty() {
            return errors.into_result_with(());
        }

        let generated = self.generated_module(&descriptor.namespace);
        for member in descriptor.members.iter().chain(&descriptor.ignored) {
            if !self.reaches(member, &descriptor.namespace, &generated) {
                errors.add(DtoGenError::InvalidModelDeclaration {
                    model: descriptor.model_name.clone(),
                    reason: format!(
                        "member `{}` is not visible from `{generated}`; make it `pub` or `pub(crate)`, or use `conversion = None`",
                        member.identifier
                    ),
                    span: member.span,
                });
            }
        }
        errors.into_result_with(())
    }

    fn reaches(&self, member: &ModelMember, model_module: &Namespace, generated: &Namespace) -> bool {
        let scope = match &member.visibility {
            Visibility::Public(_) => return true,
            Visibility::Inherited => Some(model_module.segments().to_vec()),
            Visibility::Restricted(restricted) => restricted_scope(restricted, model_module),
        };
        // Restricted visibilities stop at the crate boundary
        self.same_crate
            && scope.is_some_and(|scope| generated.segments().starts_with(&scope))
    }
}

/// The module a `pub(..)` restriction opens the member to, below the crate root.
fn restricted_scope(restricted: &VisRestricted, module: &Namespace) -> Option<Vec<String>> {
    let mut scope = Vec::new();
    for (index, segment) in restricted.path.segments.iter().enumerate() {
        let segment = segment.ident.to_string();
        match segment.as_str() {
            "crate" if index == 0 => scope.clear(),
            "self" if index == 0 => scope = module.segments().to_vec(),
            "super" => {
                if index == 0 {
                    scope = module.segments().to_vec();
                }
                scope.pop()?;
            }
            _ => scope.push(segment),
        }
    }
    Some(scope)
}
