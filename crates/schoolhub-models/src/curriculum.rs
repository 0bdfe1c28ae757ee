//! Fixed curriculum taxonomy and the academic structure planner.
//!
//! A school selects tracks (primary, O-level, A-level combinations, TVET
//! trades and levels) and optional stream labels. [`plan_academic_structure`]
//! expands the selection into one class per track, grade, combination or
//! trade, and stream, each carrying the modules taught in it. Planning is
//! pure; persistence happens in the schools service.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::ModuleType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub code: &'static str,
    pub title: &'static str,
}

const fn subject(code: &'static str, title: &'static str) -> Subject {
    Subject { code, title }
}

const MATH: Subject = subject("MATH", "Mathematics");
const ENG: Subject = subject("ENG", "English");
const KIN: Subject = subject("KIN", "Kinyarwanda");
const FRE: Subject = subject("FRE", "French");
const PHY: Subject = subject("PHY", "Physics");
const CHE: Subject = subject("CHE", "Chemistry");
const BIO: Subject = subject("BIO", "Biology");
const HIS: Subject = subject("HIS", "History");
const GEO: Subject = subject("GEO", "Geography");
const ENT: Subject = subject("ENT", "Entrepreneurship");
const ECO: Subject = subject("ECO", "Economics");
const LIT: Subject = subject("LIT", "Literature in English");
const CSC: Subject = subject("CSC", "Computer Science");

pub const PRIMARY_GRADES: &[&str] = &["P1", "P2", "P3", "P4", "P5", "P6"];
pub const PRIMARY_SUBJECTS: &[Subject] = &[
    MATH,
    ENG,
    KIN,
    FRE,
    subject("SET", "Science and Elementary Technology"),
    subject("SRS", "Social and Religious Studies"),
    subject("CRA", "Creative Arts"),
    subject("PE", "Physical Education"),
];

pub const O_LEVEL_GRADES: &[&str] = &["S1", "S2", "S3"];
pub const O_LEVEL_SUBJECTS: &[Subject] = &[
    MATH,
    ENG,
    KIN,
    FRE,
    PHY,
    CHE,
    BIO,
    HIS,
    GEO,
    ENT,
    subject("ICT", "Information and Communication Technology"),
];

pub const A_LEVEL_GRADES: &[&str] = &["S4", "S5", "S6"];
pub const A_LEVEL_GENERAL: &[Subject] = &[subject("GS", "General Studies"), ENT, ENG];

#[derive(Debug, Clone, Copy)]
pub struct Combination {
    pub code: &'static str,
    pub subjects: [Subject; 3],
}

pub const A_LEVEL_COMBINATIONS: &[Combination] = &[
    Combination { code: "PCM", subjects: [PHY, CHE, MATH] },
    Combination { code: "PCB", subjects: [PHY, CHE, BIO] },
    Combination { code: "MCB", subjects: [MATH, CHE, BIO] },
    Combination { code: "MPC", subjects: [MATH, PHY, CSC] },
    Combination { code: "MEG", subjects: [MATH, ECO, GEO] },
    Combination { code: "HEG", subjects: [HIS, ECO, GEO] },
    Combination { code: "HGL", subjects: [HIS, GEO, LIT] },
];

pub const TVET_LEVELS: &[&str] = &["L3", "L4", "L5"];
pub const TVET_GENERAL: &[Subject] = &[
    subject("COM", "Communication in English"),
    ENT,
    subject("MAT", "Applied Mathematics"),
];

#[derive(Debug, Clone, Copy)]
pub struct Trade {
    pub code: &'static str,
    pub title: &'static str,
    pub modules: &'static [Subject],
}

pub const TVET_TRADES: &[Trade] = &[
    Trade {
        code: "SOD",
        title: "Software Development",
        modules: &[
            subject("PRG", "Programming Fundamentals"),
            subject("WEB", "Web Development"),
            subject("DBS", "Database Systems"),
            subject("SAD", "Software Analysis and Design"),
        ],
    },
    Trade {
        code: "NIT",
        title: "Networking and Internet Technology",
        modules: &[
            subject("NET", "Computer Networks"),
            subject("OSA", "Operating Systems Administration"),
            subject("HWM", "Hardware Maintenance"),
            subject("NSC", "Network Security"),
        ],
    },
    Trade {
        code: "ELT",
        title: "Electrical Technology",
        modules: &[
            subject("ELI", "Electrical Installation"),
            subject("ELM", "Electrical Machines"),
            subject("CIR", "Circuit Analysis"),
            subject("TDR", "Technical Drawing"),
        ],
    },
    Trade {
        code: "BDC",
        title: "Building Construction",
        modules: &[
            subject("MAS", "Masonry"),
            subject("CON", "Concrete Works"),
            subject("BDR", "Building Drawing"),
            subject("SRV", "Land Surveying"),
        ],
    },
    Trade {
        code: "ACC",
        title: "Accounting",
        modules: &[
            subject("FAC", "Financial Accounting"),
            subject("CAC", "Cost Accounting"),
            subject("TAX", "Taxation"),
            subject("BKP", "Bookkeeping"),
        ],
    },
];

const MAX_STREAM_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurriculumError {
    #[error("Select at least one curriculum track")]
    EmptySelection,
    #[error("A-level selection needs at least one combination")]
    NoCombinations,
    #[error("TVET selection needs at least one trade")]
    NoTrades,
    #[error("Unknown A-level combination: {0}")]
    UnknownCombination(String),
    #[error("Unknown TVET trade: {0}")]
    UnknownTrade(String),
    #[error("Unknown TVET level: {0}")]
    UnknownLevel(String),
    #[error("Invalid stream label: {0:?} (use 1-3 letters or digits)")]
    InvalidStream(String),
}

/// Codes are checked by [`plan_academic_structure`], which names the
/// offending value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AcademicSelection {
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub o_level: bool,
    pub a_level: Option<ALevelSelection>,
    pub tvet: Option<TvetSelection>,
    /// Stream labels such as `["A", "B"]`; one class per stream
    #[serde(default)]
    pub streams: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ALevelSelection {
    pub combinations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TvetSelection {
    pub trades: Vec<String>,
    /// Subset of `L3`, `L4`, `L5`; all levels when omitted
    pub levels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Primary,
    OLevel,
    ALevel,
    Tvet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlannedModule {
    pub code: String,
    pub title: String,
    pub module_type: ModuleType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlannedClass {
    pub name: String,
    pub username: String,
    pub track: Track,
    pub grade: String,
    /// A-level combination or TVET trade
    pub specialization: Option<String>,
    pub stream: Option<String>,
    pub modules: Vec<PlannedModule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcademicPlan {
    /// The selection with codes uppercased, deduplicated and levels filled in.
    pub selection: AcademicSelection,
    pub classes: Vec<PlannedClass>,
}

impl AcademicPlan {
    pub fn module_count(&self) -> usize {
        self.classes.iter().map(|c| c.modules.len()).sum()
    }
}

impl AcademicSelection {
    pub fn is_empty(&self) -> bool {
        !self.primary && !self.o_level && self.a_level.is_none() && self.tvet.is_none()
    }

    /// Validates every code and returns the canonical form of the selection.
    ///
    /// Codes are matched case-insensitively and reordered to taxonomy order.
    pub fn normalize(&self) -> Result<AcademicSelection, CurriculumError> {
        if self.is_empty() {
            return Err(CurriculumError::EmptySelection);
        }

        let a_level = match &self.a_level {
            Some(a) => {
                let combinations = pick_known(
                    &a.combinations,
                    A_LEVEL_COMBINATIONS.iter().map(|c| c.code),
                    CurriculumError::UnknownCombination,
                )?;
                if combinations.is_empty() {
                    return Err(CurriculumError::NoCombinations);
                }
                Some(ALevelSelection { combinations })
            }
            None => None,
        };

        let tvet = match &self.tvet {
            Some(t) => {
                let trades = pick_known(
                    &t.trades,
                    TVET_TRADES.iter().map(|t| t.code),
                    CurriculumError::UnknownTrade,
                )?;
                if trades.is_empty() {
                    return Err(CurriculumError::NoTrades);
                }
                let levels = match t.levels.as_deref() {
                    Some(levels) if !levels.is_empty() => pick_known(
                        levels,
                        TVET_LEVELS.iter().copied(),
                        CurriculumError::UnknownLevel,
                    )?,
                    _ => TVET_LEVELS.iter().map(|l| l.to_string()).collect(),
                };
                Some(TvetSelection {
                    trades,
                    levels: Some(levels),
                })
            }
            None => None,
        };

        let mut streams: Vec<String> = Vec::new();
        for raw in &self.streams {
            let label = raw.trim().to_ascii_uppercase();
            if label.is_empty()
                || label.len() > MAX_STREAM_LEN
                || !label.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(CurriculumError::InvalidStream(raw.clone()));
            }
            if !streams.contains(&label) {
                streams.push(label);
            }
        }

        Ok(AcademicSelection {
            primary: self.primary,
            o_level: self.o_level,
            a_level,
            tvet,
            streams,
        })
    }
}

/// Uppercases `requested`, rejects codes missing from `known`, and returns
/// the distinct matches in `known` order.
fn pick_known<'a>(
    requested: &[String],
    known: impl Iterator<Item = &'a str> + Clone,
    unknown: fn(String) -> CurriculumError,
) -> Result<Vec<String>, CurriculumError> {
    let requested: Vec<String> = requested
        .iter()
        .map(|code| code.trim().to_ascii_uppercase())
        .collect();

    if let Some(bad) = requested
        .iter()
        .find(|code| !known.clone().any(|k| k == code.as_str()))
    {
        return Err(unknown(bad.clone()));
    }

    Ok(known
        .filter(|k| requested.iter().any(|r| r == k))
        .map(str::to_string)
        .collect())
}

fn modules_of(subjects: &[Subject], module_type: ModuleType) -> impl Iterator<Item = PlannedModule> + '_ {
    subjects.iter().map(move |s| PlannedModule {
        code: s.code.to_string(),
        title: s.title.to_string(),
        module_type,
    })
}

struct ClassBuilder<'a> {
    school_username: &'a str,
    streams: Vec<Option<String>>,
    classes: Vec<PlannedClass>,
}

impl ClassBuilder<'_> {
    fn push(
        &mut self,
        track: Track,
        grade: &str,
        specialization: Option<&str>,
        modules: &[PlannedModule],
    ) {
        for stream in &self.streams {
            let stream = stream.as_deref();
            let parts: Vec<&str> = [Some(grade), specialization, stream]
                .into_iter()
                .flatten()
                .collect();

            self.classes.push(PlannedClass {
                name: parts.join(" "),
                username: format!(
                    "{}-{}",
                    self.school_username,
                    parts.join("-").to_ascii_lowercase()
                ),
                track,
                grade: grade.to_string(),
                specialization: specialization.map(str::to_string),
                stream: stream.map(str::to_string),
                modules: modules.to_vec(),
            });
        }
    }
}

/// Expands `selection` into the classes and modules of a school.
///
/// Iteration order is track, grade, combination or trade, then stream, so
/// the output is deterministic for a given selection.
pub fn plan_academic_structure(
    school_username: &str,
    selection: &AcademicSelection,
) -> Result<AcademicPlan, CurriculumError> {
    let selection = selection.normalize()?;

    let streams: Vec<Option<String>> = if selection.streams.is_empty() {
        vec![None]
    } else {
        selection.streams.iter().cloned().map(Some).collect()
    };

    let mut builder = ClassBuilder {
        school_username,
        streams,
        classes: Vec::new(),
    };

    if selection.primary {
        let modules: Vec<_> = modules_of(PRIMARY_SUBJECTS, ModuleType::Core).collect();
        for grade in PRIMARY_GRADES {
            builder.push(Track::Primary, grade, None, &modules);
        }
    }

    if selection.o_level {
        let modules: Vec<_> = modules_of(O_LEVEL_SUBJECTS, ModuleType::Core).collect();
        for grade in O_LEVEL_GRADES {
            builder.push(Track::OLevel, grade, None, &modules);
        }
    }

    if let Some(a_level) = &selection.a_level {
        let combinations: Vec<&Combination> = A_LEVEL_COMBINATIONS
            .iter()
            .filter(|c| a_level.combinations.iter().any(|code| code == c.code))
            .collect();

        for grade in A_LEVEL_GRADES {
            for combination in &combinations {
                let modules: Vec<_> = modules_of(&combination.subjects, ModuleType::Core)
                    .chain(modules_of(A_LEVEL_GENERAL, ModuleType::General))
                    .collect();
                builder.push(Track::ALevel, grade, Some(combination.code), &modules);
            }
        }
    }

    if let Some(tvet) = &selection.tvet {
        let trades: Vec<&Trade> = TVET_TRADES
            .iter()
            .filter(|t| tvet.trades.iter().any(|code| code == t.code))
            .collect();
        let levels = tvet.levels.clone().unwrap_or_default();

        for level in &levels {
            for trade in &trades {
                let modules: Vec<_> = modules_of(trade.modules, ModuleType::Specific)
                    .chain(modules_of(TVET_GENERAL, ModuleType::General))
                    .collect();
                builder.push(Track::Tvet, level, Some(trade.code), &modules);
            }
        }
    }

    Ok(AcademicPlan {
        classes: builder.classes,
        selection,
    })
}
