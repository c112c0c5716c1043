//! Fixed-point module loader.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::schema::ModulesConfig;
use crate::domain::{Domain, DomainRegistry};
use crate::error::{ModuleFailure, ProcessError, ProcessResult};

/// Opens one module file. The opener owns whatever keeps it loaded.
pub trait ModuleOpener: Send {
    fn open(&mut self, module: &str) -> Result<(), String>;
}

/// Maps domains and the process to module file names.
#[derive(Debug, Clone)]
pub struct ModuleNaming {
    lib_name: String,
    interface_suffix: String,
    search_path: Option<PathBuf>,
}

impl ModuleNaming {
    pub fn new(lib_name: impl Into<String>, interface_suffix: impl Into<String>) -> Self {
        Self {
            lib_name: lib_name.into(),
            interface_suffix: interface_suffix.into(),
            search_path: None,
        }
    }

    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_path = Some(dir.into());
        self
    }

    pub fn from_config(config: &ModulesConfig) -> Self {
        Self {
            lib_name: config.lib_name.clone(),
            interface_suffix: config.interface_suffix.clone(),
            search_path: config.search_path.clone(),
        }
    }

    pub fn lib_name(&self) -> &str {
        &self.lib_name
    }

    /// `domainName[interfaceSuffix]_libName`, before platform naming.
    pub fn domain_stem(&self, domain: &Domain) -> String {
        let suffix = if domain.is_interface() {
            self.interface_suffix.as_str()
        } else {
            ""
        };
        format!("{}{}_{}", domain.name(), suffix, self.lib_name)
    }

    /// `processName_libName`, before platform naming.
    pub fn process_stem(&self, process_name: &str) -> String {
        format!("{}_{}", process_name, self.lib_name)
    }

    /// Platform file name for a stem, prefixed by the search path if any.
    pub fn file_for(&self, stem: &str) -> String {
        let file = PathBuf::from(libloading::library_filename(stem));
        match &self.search_path {
            Some(dir) => dir.join(file).display().to_string(),
            None => file.display().to_string(),
        }
    }

    /// One candidate file per registered domain, in sorted order.
    pub fn candidates(&self, domains: &DomainRegistry) -> BTreeSet<String> {
        domains
            .iter()
            .map(|domain| self.file_for(&self.domain_stem(domain)))
            .collect()
    }
}

/// What a successful load did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Modules in the order they loaded; the process module, if any, last.
    pub loaded: Vec<String>,
    /// Full passes made over the domain candidates.
    pub passes: usize,
}

/// Loads a candidate set with no ordering information.
pub struct ModuleLoader<'a> {
    opener: &'a mut dyn ModuleOpener,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(opener: &'a mut dyn ModuleOpener) -> Self {
        Self { opener }
    }

    /// Retry the remaining candidates pass after pass for as long as each
    /// pass fails strictly fewer modules than the one before.
    pub fn load_domains(&mut self, candidates: BTreeSet<String>) -> ProcessResult<LoadReport> {
        let mut remaining = candidates;
        let mut report = LoadReport::default();
        let mut previous_errors: Option<usize> = None;

        while !remaining.is_empty() {
            report.passes += 1;
            let mut failures = Vec::new();

            let attempt: Vec<String> = remaining.iter().cloned().collect();
            for module in attempt {
                match self.opener.open(&module) {
                    Ok(()) => {
                        tracing::debug!(module = %module, pass = report.passes, "Module loaded");
                        remaining.remove(&module);
                        report.loaded.push(module);
                    }
                    Err(reason) => failures.push(ModuleFailure { module, reason }),
                }
            }

            if remaining.is_empty() {
                break;
            }

            let errors = failures.len();
            tracing::debug!(pass = report.passes, errors, "Module pass incomplete");
            if previous_errors.is_some_and(|previous| errors >= previous) {
                tracing::error!(unresolved = errors, passes = report.passes, "Module loading stalled");
                return Err(ProcessError::ModuleLoadFailure { failures });
            }
            previous_errors = Some(errors);
        }

        tracing::info!(modules = report.loaded.len(), passes = report.passes, "Domain modules loaded");
        Ok(report)
    }

    /// Load the process-level module. No retry.
    pub fn load_process(&mut self, module: &str) -> ProcessResult<()> {
        self.opener
            .open(module)
            .map_err(|reason| ProcessError::ProcessModuleLoadFailure {
                module: module.to_string(),
                reason,
            })?;
        tracing::info!(module, "Process module loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    /// Succeeds for a module once all of its dependencies have loaded.
    #[derive(Default)]
    struct Scripted {
        deps: HashMap<String, Vec<String>>,
        missing: HashSet<String>,
        loaded: HashSet<String>,
        attempts: Vec<String>,
    }

    impl Scripted {
        fn depends(mut self, module: &str, on: &[&str]) -> Self {
            self.deps
                .insert(module.into(), on.iter().map(|s| s.to_string()).collect());
            self
        }

        fn missing(mut self, module: &str) -> Self {
            self.missing.insert(module.into());
            self
        }
    }

    impl ModuleOpener for Scripted {
        fn open(&mut self, module: &str) -> Result<(), String> {
            self.attempts.push(module.to_string());
            if self.missing.contains(module) {
                return Err(format!("{module}: cannot open shared object file"));
            }
            let deps = self.deps.get(module).cloned().unwrap_or_default();
            if let Some(dep) = deps.iter().find(|d| !self.loaded.contains(*d)) {
                return Err(format!("{module}: undefined symbol from {dep}"));
            }
            self.loaded.insert(module.to_string());
            Ok(())
        }
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dependent_module_converges_in_two_passes() {
        let mut opener = Scripted::default().depends("domainA_lib", &["domainB_lib"]);
        let report = ModuleLoader::new(&mut opener)
            .load_domains(set(&["domainA_lib", "domainB_lib"]))
            .unwrap();

        assert_eq!(report.passes, 2);
        assert_eq!(report.loaded, vec!["domainB_lib", "domainA_lib"]);
        assert_eq!(opener.attempts, vec!["domainA_lib", "domainB_lib", "domainA_lib"]);
    }

    #[test]
    fn chain_against_attempt_order_converges() {
        let mut opener = Scripted::default()
            .depends("a", &["b"])
            .depends("b", &["c"])
            .depends("c", &["d"]);
        let report = ModuleLoader::new(&mut opener)
            .load_domains(set(&["a", "b", "c", "d"]))
            .unwrap();
        assert_eq!(report.loaded, vec!["d", "c", "b", "a"]);
        assert_eq!(report.passes, 4);
    }

    #[test]
    fn cycle_terminates_and_reports_members() {
        let mut opener = Scripted::default()
            .depends("a", &["b"])
            .depends("b", &["a"]);
        let err = ModuleLoader::new(&mut opener)
            .load_domains(set(&["a", "b", "free"]))
            .unwrap_err();

        let ProcessError::ModuleLoadFailure { failures } = err else {
            panic!("expected ModuleLoadFailure");
        };
        let names: Vec<_> = failures.iter().map(|f| f.module.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(opener.loaded.contains("free"));
    }

    #[test]
    fn absent_file_fails_with_last_error() {
        let mut opener = Scripted::default().missing("ghost");
        let err = ModuleLoader::new(&mut opener)
            .load_domains(set(&["ghost", "real"]))
            .unwrap_err();
        assert!(err.to_string().contains("ghost: cannot open shared object file"));
    }

    #[test]
    fn empty_candidate_set_is_trivially_loaded() {
        let mut opener = Scripted::default();
        let report = ModuleLoader::new(&mut opener).load_domains(BTreeSet::new()).unwrap();
        assert_eq!(report, LoadReport::default());
    }

    #[test]
    fn process_module_failure_is_fatal() {
        let mut opener = Scripted::default().missing("proc_lib");
        let err = ModuleLoader::new(&mut opener).load_process("proc_lib").unwrap_err();
        assert!(matches!(err, ProcessError::ProcessModuleLoadFailure { .. }));
    }

    #[test]
    fn naming_applies_interface_suffix() {
        let mut domains = DomainRegistry::new();
        domains.register("Billing");
        domains.register_with("Ledger", false);

        let naming = ModuleNaming::new("metadata", "_if");
        let stems: Vec<_> = domains.iter().map(|d| naming.domain_stem(d)).collect();
        assert_eq!(stems, vec!["Billing_if_metadata", "Ledger_metadata"]);
        assert_eq!(naming.process_stem("accounts"), "accounts_metadata");
    }

    #[test]
    fn file_names_follow_platform_and_search_path() {
        let naming = ModuleNaming::new("metadata", "_if").with_search_path("/opt/app/lib");
        let file = naming.file_for("Ledger_metadata");
        let expected = PathBuf::from("/opt/app/lib")
            .join(libloading::library_filename("Ledger_metadata"))
            .display()
            .to_string();
        assert_eq!(file, expected);
    }
}
