//! Reconcile command - apply trait selections to a class attribute.

use clap::Args;
use vitrail::atelier::{reconcile, ClassList, ManagedClassSpec};

use super::{split_list, CommandError};

#[derive(Args)]
pub struct ReconcileArgs {
    /// Current class attribute
    #[arg(long, default_value = "")]
    pub current: String,

    /// Classes that are always present (repeatable)
    #[arg(long)]
    pub required: Vec<String>,

    /// Mutually exclusive classes, comma-separated (repeatable)
    #[arg(long)]
    pub family: Vec<String>,

    /// Selected class values, first selection per family wins (repeatable)
    #[arg(long)]
    pub select: Vec<String>,
}

pub fn run(args: ReconcileArgs) -> Result<String, CommandError> {
    let required: ClassList = args.required.iter().flat_map(|r| split_list(r)).collect();
    let families = args
        .family
        .iter()
        .map(|family| split_list(family).collect())
        .collect();
    let spec = ManagedClassSpec::new(required, families)?;
    let next = reconcile(&ClassList::parse(&args.current), &spec, &args.select);
    tracing::debug!("reconciled '{}' to '{}'", args.current, next);
    Ok(next.to_attribute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrail::atelier::ClassSpecError;

    fn args(current: &str, required: &[&str], family: &[&str], select: &[&str]) -> ReconcileArgs {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();
        ReconcileArgs {
            current: current.to_owned(),
            required: owned(required),
            family: owned(family),
            select: owned(select),
        }
    }

    #[test]
    fn test_card_shadow() {
        let output = run(args(
            "classA card shadow-sm",
            &["card"],
            &["shadow-sm,shadow,shadow-lg"],
            &["shadow-lg"],
        ))
        .unwrap();
        assert_eq!(output, "classA card shadow-lg");
    }

    #[test]
    fn test_empty_selection_clears_family() {
        let output = run(args("x shadow card", &["card"], &["shadow-sm shadow shadow-lg"], &[""])).unwrap();
        assert_eq!(output, "x card");
    }

    #[test]
    fn test_required_class_in_family_is_rejected() {
        let result = run(args("", &["card"], &["card,shadow"], &[]));
        assert!(matches!(
            result,
            Err(CommandError::Classes(ClassSpecError::RequiredInFamily { .. }))
        ));
    }
}
