//! Verify command implementation.

use super::format_size;
use docpack_core::Document;
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of checks run.
    pub checks_run: usize,
    /// List of errors found.
    pub errors: Vec<String>,
    /// Notes that do not fail verification.
    pub warnings: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn check<E: std::fmt::Display>(&mut self, name: &str, outcome: Result<(), E>) {
        self.checks_run += 1;
        match outcome {
            Ok(()) => println!("  {name}: ok"),
            Err(e) => {
                println!("  {name}: FAILED");
                self.errors.push(format!("{name}: {e}"));
            }
        }
    }
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying document at {:?}", path);
    println!();

    let bytes = std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let result = verify_bytes(&bytes);

    println!();
    print_result(&result);
    println!();
    if result.is_ok() {
        println!("✓ Document verification passed");
        Ok(())
    } else {
        println!("✗ Document verification failed");
        Err("Verification failed".into())
    }
}

fn verify_bytes(bytes: &[u8]) -> VerifyResult {
    let mut result = VerifyResult::default();

    let doc = match Document::deserialize(bytes) {
        Ok(doc) => {
            result.check::<String>("decode", Ok(()));
            doc
        }
        Err(e) => {
            result.check("decode", Err(e));
            return result;
        }
    };

    result.check("layout", doc.verify());
    result.check("values", doc.to_value().map(|_| ()));
    result.check(
        "re-encode",
        doc.serialize().and_then(|out| {
            if out == bytes {
                Ok(())
            } else {
                Document::deserialize(&out).map(|_| ())
            }
        }),
    );

    let stats = doc.stats();
    if stats.orphaned_bytes() > 0 {
        result.warnings.push(format!(
            "{} not referenced by any value",
            format_size(stats.orphaned_bytes())
        ));
    }
    result
}

fn print_result(result: &VerifyResult) {
    println!("Checks run: {}", result.checks_run);
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  - {error}");
        }
    }
}
