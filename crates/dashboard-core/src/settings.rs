use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::filters::{DateRange, FilterSpec, PepFilter, Selection};
use crate::time_utils::parse_date;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Case and check reporting dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "case-dashboard",
    about = "Filter, summarise and export case/check records",
    version
)]
pub struct Settings {
    /// Input data file (CSV)
    #[arg(long, default_value = "Data.csv")]
    pub data: PathBuf,

    /// View mode
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "summary", "export"])]
    pub view: String,

    /// Export target for the filtered records
    #[arg(long, default_value = "filtered_data.csv")]
    pub output: PathBuf,

    /// JSON schema config describing column names and status rules
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Append grand totals to cross-tabulations
    #[arg(long, overrides_with = "no_totals")]
    pub totals: bool,

    /// Turn grand totals off, overriding a saved `--totals`
    #[arg(long = "no-totals", overrides_with = "totals")]
    pub no_totals: bool,

    /// Case statuses to keep (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub case_status: Vec<String>,

    /// Raw check statuses to keep (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub check_status: Vec<String>,

    /// Assignees to keep (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub assignee: Vec<String>,

    /// Check types to keep (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub check_type: Vec<String>,

    /// Countries to keep (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub country: Vec<String>,

    /// Case-insensitive substring search over countries
    #[arg(long)]
    pub country_search: Option<String>,

    /// Risk levels to keep (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub risk_level: Vec<String>,

    /// Politically exposed person filter
    #[arg(long, value_enum, default_value_t = PepFilter::All)]
    pub pep: PepFilter,

    /// First day of the date range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the date range (YYYY-MM-DD, compared at midnight)
    #[arg(long, value_parser = parse_date_arg)]
    pub end_date: Option<NaiveDate>,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.case-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pep: Option<PepFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<bool>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".case-dashboard").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values. Column selections and dates
        // are never persisted: they depend on the file being viewed.
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "data") {
            if let Some(v) = last.data {
                settings.data = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "pep") {
            if let Some(v) = last.pep {
                settings.pep = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "totals")
            && !is_arg_explicitly_set(&matches, "no_totals")
        {
            if let Some(v) = last.totals {
                settings.totals = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Build the filter specification described by the command line.
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            cases_status: Selection::from_values(self.case_status.iter().cloned()),
            check_status: Selection::from_values(self.check_status.iter().cloned()),
            assignee: Selection::from_values(self.assignee.iter().cloned()),
            check_type: Selection::from_values(self.check_type.iter().cloned()),
            country: Selection::from_values(self.country.iter().cloned()),
            country_search: self
                .country_search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            risk_level: Selection::from_values(self.risk_level.iter().cloned()),
            pep: self.pep,
            date_range: DateRange::new(self.start_date, self.end_date),
        }
    }

    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            view: Some(s.view.clone()),
            data: Some(s.data.clone()),
            pep: Some(s.pep),
            totals: Some(s.totals),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            theme: Some("dark".to_string()),
            view: Some("summary".to_string()),
            data: Some(PathBuf::from("/data/cases.csv")),
            pep: Some(PepFilter::Yes),
            totals: Some(true),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.theme, Some("dark".to_string()));
        assert_eq!(loaded.view, Some("summary".to_string()));
        assert_eq!(loaded.data, Some(PathBuf::from("/data/cases.csv")));
        assert_eq!(loaded.pep, Some(PepFilter::Yes));
        assert_eq!(loaded.totals, Some(true));
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.theme.is_none());
        assert!(loaded.data.is_none());
        assert!(loaded.pep.is_none());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["case-dashboard"]);

        assert_eq!(settings.data, PathBuf::from("Data.csv"));
        assert_eq!(settings.view, "dashboard");
        assert_eq!(settings.output, PathBuf::from("filtered_data.csv"));
        assert!(settings.schema.is_none());
        assert!(!settings.totals);
        assert!(settings.case_status.is_empty());
        assert_eq!(settings.pep, PepFilter::All);
        assert!(settings.start_date.is_none());
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
        assert!(settings.filter_spec().is_unconstrained());
    }

    #[test]
    fn test_settings_cli_filters_build_spec() {
        let settings = Settings::parse_from([
            "case-dashboard",
            "--case-status",
            "open,rejected",
            "--assignee",
            "Alice",
            "--assignee",
            "Bob",
            "--country-search",
            "  fra ",
            "--pep",
            "yes",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-03-31",
        ]);
        let spec = settings.filter_spec();

        assert_eq!(spec.cases_status, Selection::from_values(["open", "rejected"]));
        assert_eq!(spec.assignee, Selection::from_values(["Alice", "Bob"]));
        assert_eq!(spec.country_search.as_deref(), Some("fra"));
        assert_eq!(spec.pep, PepFilter::Yes);
        assert_eq!(spec.date_range.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(spec.date_range.end, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert!(spec.check_type.is_all());
    }

    #[test]
    fn test_settings_rejects_bad_date() {
        let result = Settings::try_parse_from(["case-dashboard", "--start-date", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            theme: Some("dark".to_string()),
            data: Some(PathBuf::from("other.csv")),
            pep: Some(PepFilter::No),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["case-dashboard".into()], &config_path);
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.data, PathBuf::from("other.csv"));
        assert_eq!(settings.pep, PepFilter::No);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            theme: Some("dark".to_string()),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["case-dashboard".into(), "--theme".into(), "light".into()],
            &config_path,
        );
        assert_eq!(settings.theme, "light");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("classic".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        Settings::load_with_last_used_impl(
            vec!["case-dashboard".into(), "--clear".into()],
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            vec!["case-dashboard".into(), "--debug".into()],
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec!["case-dashboard".into(), "--totals".into()],
            &config_path,
        );

        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.totals, Some(true));
        assert_eq!(loaded.view, Some("dashboard".to_string()));
    }

    #[test]
    fn test_no_totals_overrides_persisted_totals() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let on = Settings::load_with_last_used_impl(
            vec!["case-dashboard".into(), "--totals".into()],
            &config_path,
        );
        assert!(on.totals);

        let sticky = Settings::load_with_last_used_impl(vec!["case-dashboard".into()], &config_path);
        assert!(sticky.totals, "saved value applies when no flag is given");

        let off = Settings::load_with_last_used_impl(
            vec!["case-dashboard".into(), "--no-totals".into()],
            &config_path,
        );
        assert!(!off.totals);
        assert_eq!(LastUsedParams::load_from(&config_path).totals, Some(false));

        let later = Settings::load_with_last_used_impl(vec!["case-dashboard".into()], &config_path);
        assert!(!later.totals);
    }

    #[test]
    fn test_last_totals_flag_wins() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            vec!["case-dashboard".into(), "--no-totals".into(), "--totals".into()],
            &tmp_config_path(&tmp),
        );
        assert!(settings.totals);
    }
}
