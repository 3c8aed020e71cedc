//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use crate::noise::NoiseModel;
use crate::physics_engine::DeclineModel;

use super::SimulatorConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for SimulatorConfig.
///
/// Array-of-table entries share one path per field (`dr_rigs.formations.name`).
/// Any new field added to the config structs must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [simulation]
        "simulation",
        "simulation.rate_hz",
        "simulation.realtime_factor",
        "simulation.seed",
        "simulation.quiet_noise",
        // [[ct_units]]
        "ct_units",
        "ct_units.name",
        "ct_units.material",
        "ct_units.outer_diameter",
        "ct_units.wall_thickness",
        "ct_units.target_depth",
        "ct_units.pipe_weight",
        "ct_units.work_pressure",
        "ct_units.work_flow_rate",
        "ct_units.rih_speed",
        "ct_units.pooh_speed",
        "ct_units.work_duration",
        // [[dr_rigs]]
        "dr_rigs",
        "dr_rigs.name",
        "dr_rigs.bit_diameter",
        "dr_rigs.bit_nozzles",
        "dr_rigs.bit_tfa",
        "dr_rigs.hole_size",
        "dr_rigs.drillpipe_od",
        "dr_rigs.drillpipe_id",
        "dr_rigs.target_wob",
        "dr_rigs.target_rpm",
        "dr_rigs.target_flow_rate",
        "dr_rigs.mud_weight",
        "dr_rigs.start_depth",
        // [[dr_rigs.formations]]
        "dr_rigs.formations",
        "dr_rigs.formations.name",
        "dr_rigs.formations.top_depth",
        "dr_rigs.formations.bottom_depth",
        "dr_rigs.formations.compressive_strength",
        "dr_rigs.formations.drillability",
        "dr_rigs.formations.pore_pressure_gradient",
        "dr_rigs.formations.fracture_gradient",
        // [[rv_wells]]
        "rv_wells",
        "rv_wells.name",
        "rv_wells.decline_type",
        "rv_wells.initial_rate",
        "rv_wells.decline_rate",
        "rv_wells.hyperbolic_exponent",
        "rv_wells.start_date",
        "rv_wells.initial_pressure",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables inside arrays are walked under the array's
/// path, and each path is reported once.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    collect_keys(value, prefix, &mut keys);
    keys
}

fn collect_keys(value: &toml::Value, prefix: &str, keys: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };
    for (k, v) in table {
        let path = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        if !keys.contains(&path) {
            keys.push(path.clone());
        }
        match v {
            toml::Value::Table(_) => collect_keys(v, &path, keys),
            toml::Value::Array(items) => {
                for item in items.iter().filter(|i| i.is_table()) {
                    collect_keys(item, &path, keys);
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        // Ties broken alphabetically so suggestions are stable
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

fn check_positive(value: f64, field: &str, errors: &mut Vec<String>) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(format!("{field} = {value} must be a positive number"));
    }
}

fn check_non_negative(value: f64, field: &str, errors: &mut Vec<String>) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(format!("{field} = {value} must be a non-negative number"));
    }
}

/// Validate physical ranges on a parsed SimulatorConfig.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(config: &SimulatorConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for unit in &config.ct_units {
        let n = &unit.name;
        check_positive(unit.outer_diameter, &format!("ct_units[{n}].outer_diameter"), &mut errors);
        check_positive(unit.wall_thickness, &format!("ct_units[{n}].wall_thickness"), &mut errors);
        check_positive(unit.target_depth, &format!("ct_units[{n}].target_depth"), &mut errors);
        check_positive(unit.rih_speed, &format!("ct_units[{n}].rih_speed"), &mut errors);
        check_positive(unit.pooh_speed, &format!("ct_units[{n}].pooh_speed"), &mut errors);
        check_non_negative(unit.pipe_weight, &format!("ct_units[{n}].pipe_weight"), &mut errors);
        check_non_negative(unit.work_pressure, &format!("ct_units[{n}].work_pressure"), &mut errors);
        check_non_negative(unit.work_flow_rate, &format!("ct_units[{n}].work_flow_rate"), &mut errors);
        check_non_negative(unit.work_duration, &format!("ct_units[{n}].work_duration"), &mut errors);

        // A wall at or past the radius has no bore; stress reads 0
        if unit.wall_thickness >= unit.outer_diameter / 2.0 {
            warnings.push(ValidationWarning {
                field: "ct_units.wall_thickness".to_string(),
                message: format!(
                    "ct_units[{n}].wall_thickness = {:.3} is at least half the OD ({:.3}); axial stress will read 0",
                    unit.wall_thickness, unit.outer_diameter
                ),
                suggestion: None,
            });
        }
    }

    for rig in &config.dr_rigs {
        let n = &rig.name;
        check_positive(rig.bit_diameter, &format!("dr_rigs[{n}].bit_diameter"), &mut errors);
        check_positive(rig.hole_size, &format!("dr_rigs[{n}].hole_size"), &mut errors);
        check_positive(rig.drillpipe_od, &format!("dr_rigs[{n}].drillpipe_od"), &mut errors);
        check_positive(rig.mud_weight, &format!("dr_rigs[{n}].mud_weight"), &mut errors);
        check_non_negative(rig.drillpipe_id, &format!("dr_rigs[{n}].drillpipe_id"), &mut errors);
        check_non_negative(rig.bit_tfa, &format!("dr_rigs[{n}].bit_tfa"), &mut errors);
        check_non_negative(rig.target_wob, &format!("dr_rigs[{n}].target_wob"), &mut errors);
        check_non_negative(rig.target_rpm, &format!("dr_rigs[{n}].target_rpm"), &mut errors);
        check_non_negative(rig.target_flow_rate, &format!("dr_rigs[{n}].target_flow_rate"), &mut errors);
        check_non_negative(rig.start_depth, &format!("dr_rigs[{n}].start_depth"), &mut errors);

        if rig.drillpipe_id >= rig.drillpipe_od {
            errors.push(format!(
                "dr_rigs[{n}].drillpipe_id ({:.3}) must be less than drillpipe_od ({:.3})",
                rig.drillpipe_id, rig.drillpipe_od
            ));
        }
        if rig.drillpipe_od >= rig.hole_size {
            errors.push(format!(
                "dr_rigs[{n}].drillpipe_od ({:.3}) must be less than hole_size ({:.3})",
                rig.drillpipe_od, rig.hole_size
            ));
        }
        if rig.bit_tfa == 0.0 {
            warnings.push(ValidationWarning {
                field: "dr_rigs.bit_tfa".to_string(),
                message: format!("dr_rigs[{n}].bit_tfa = 0; bit pressure drop will read 0"),
                suggestion: None,
            });
        }

        if rig.formations.is_empty() {
            errors.push(format!("dr_rigs[{n}].formations must not be empty"));
        }
        for f in &rig.formations {
            let fname = &f.name;
            if !(f.top_depth.is_finite() && f.bottom_depth.is_finite() && f.top_depth < f.bottom_depth) {
                errors.push(format!(
                    "dr_rigs[{n}].formations[{fname}]: top_depth ({}) must be above bottom_depth ({})",
                    f.top_depth, f.bottom_depth
                ));
            }
            if !(0.0..=1.0).contains(&f.drillability) {
                errors.push(format!(
                    "dr_rigs[{n}].formations[{fname}].drillability = {} must be within 0-1",
                    f.drillability
                ));
            }
            check_positive(
                f.compressive_strength,
                &format!("dr_rigs[{n}].formations[{fname}].compressive_strength"),
                &mut errors,
            );
            check_non_negative(
                f.pore_pressure_gradient,
                &format!("dr_rigs[{n}].formations[{fname}].pore_pressure_gradient"),
                &mut errors,
            );
            check_non_negative(
                f.fracture_gradient,
                &format!("dr_rigs[{n}].formations[{fname}].fracture_gradient"),
                &mut errors,
            );
            if f.fracture_gradient <= f.pore_pressure_gradient {
                warnings.push(ValidationWarning {
                    field: "dr_rigs.formations.fracture_gradient".to_string(),
                    message: format!(
                        "dr_rigs[{n}].formations[{fname}]: fracture gradient {:.3} is not above pore pressure gradient {:.3}",
                        f.fracture_gradient, f.pore_pressure_gradient
                    ),
                    suggestion: None,
                });
            }
        }
    }

    for well in &config.rv_wells {
        let n = &well.name;
        if let Err(e) = DeclineModel::new(well.decline_params(), NoiseModel::quiet()) {
            errors.push(format!("rv_wells[{n}]: {e}"));
        }
        check_positive(well.initial_pressure, &format!("rv_wells[{n}].initial_pressure"), &mut errors);
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CtUnitConfig, DrillingRigConfig, ReservoirWellConfig};
    use crate::types::DeclineType;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("drilability", "drillability"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [simulation]
            rate_hz = 2.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"simulation".to_string()));
        assert!(keys.contains(&"simulation.rate_hz".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[dr_rigs]]
            name = "A"
            [[dr_rigs.formations]]
            name = "Shale"
            [[dr_rigs]]
            name = "B"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert_eq!(
            keys.iter().filter(|k| k.as_str() == "dr_rigs.name").count(),
            1
        );
        assert!(keys.contains(&"dr_rigs.formations.name".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[[ct_units]]
name = "CT-1"
wall_thicknes = 0.2
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "ct_units.wall_thicknes");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("ct_units.wall_thickness")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[simulation]
rate_hz = 2.0
seed = 42

[[rv_wells]]
name = "W-1"
decline_type = "harmonic"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        let suggestion = suggest_correction("completely_unrelated_garbage_key_xyz", &known);
        assert!(suggestion.is_none());
    }

    #[test]
    fn test_default_fleet_ranges_clean() {
        let config = SimulatorConfig::default();
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty(), "Defaults should produce no errors: {:?}", errors);
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {:?}", warnings);
    }

    #[test]
    fn test_thick_wall_is_warning_not_error() {
        let mut unit = CtUnitConfig::named("CT-1");
        unit.wall_thickness = 1.2;
        let config = SimulatorConfig {
            ct_units: vec![unit],
            dr_rigs: Vec::new(),
            rv_wells: Vec::new(),
            ..SimulatorConfig::default()
        };
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "ct_units.wall_thickness"));
    }

    #[test]
    fn test_bad_formation_column() {
        let mut rig = DrillingRigConfig::named("DR-1");
        rig.formations[0].drillability = 1.5;
        rig.formations[1].bottom_depth = rig.formations[1].top_depth;
        let config = SimulatorConfig {
            ct_units: Vec::new(),
            dr_rigs: vec![rig],
            rv_wells: Vec::new(),
            ..SimulatorConfig::default()
        };
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("drillability")));
        assert!(errors.iter().any(|e| e.contains("top_depth")));
    }

    #[test]
    fn test_empty_formations_rejected() {
        let mut rig = DrillingRigConfig::named("DR-1");
        rig.formations.clear();
        let config = SimulatorConfig {
            ct_units: Vec::new(),
            dr_rigs: vec![rig],
            rv_wells: Vec::new(),
            ..SimulatorConfig::default()
        };
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("formations must not be empty")));
    }

    #[test]
    fn test_hyperbolic_without_exponent_rejected() {
        let mut well = ReservoirWellConfig::named("W-1");
        well.decline_type = DeclineType::Hyperbolic;
        well.hyperbolic_exponent = None;
        let config = SimulatorConfig {
            ct_units: Vec::new(),
            dr_rigs: Vec::new(),
            rv_wells: vec![well],
            ..SimulatorConfig::default()
        };
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("rv_wells[W-1]") && e.contains("exponent b")));
    }
}
