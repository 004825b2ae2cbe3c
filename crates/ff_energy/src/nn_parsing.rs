//! Parameter file parsing & corresponding energy tables.
//!
//! Two on-disk layouts are accepted for 2-key sections (`stack`,
//! `stack_enthalpies`, `dangle5`, `dangle3`, ...): the Turner-2004 "block"
//! form, one row per outer key with every inner key's value on that row,
//! and an older Turner-1999 "triplet" form, one `<key1> <key2> <value>` row
//! per entry. The two are told apart per-section: the first data line seen
//! after a section header is inspected, and if it tokenizes to exactly
//! three fields the whole section is parsed as triplets.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::io::{BufRead, BufReader};

use ahash::AHashMap;

use crate::{Base, BCOUNT as B, NucleotideVec, PairTypeRNA, PCOUNT as P};

#[derive(Debug)]
pub enum ParamError {
    Io(std::io::Error),
    Parse(String),
    UnknownSection(String),
}

impl From<std::io::Error> for ParamError {
    fn from(e: std::io::Error) -> Self {
        ParamError::Io(e)
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::Io(e) => write!(f, "I/O error: {}", e),
            ParamError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ParamError::UnknownSection(s) => write!(f, "Unknown parameter file section: {:?}", s),
        }
    }
}

impl std::error::Error for ParamError {}

const PAIR_ORDER: [PairTypeRNA; P] = [
    PairTypeRNA::CG,
    PairTypeRNA::GC,
    PairTypeRNA::GU,
    PairTypeRNA::UG,
    PairTypeRNA::AU,
    PairTypeRNA::UA,
    PairTypeRNA::NN,
];

const BASE_ORDER: [Base; B] = [Base::N, Base::A, Base::C, Base::G, Base::U];

fn resolve_pair(tok: &str) -> Option<PairTypeRNA> {
    Some(match tok {
        "CG" => PairTypeRNA::CG,
        "GC" => PairTypeRNA::GC,
        "GU" => PairTypeRNA::GU,
        "UG" => PairTypeRNA::UG,
        "AU" => PairTypeRNA::AU,
        "UA" => PairTypeRNA::UA,
        "NN" => PairTypeRNA::NN,
        _ => return None,
    })
}

fn resolve_base(tok: &str) -> Option<Base> {
    Base::try_from(tok.chars().next()?).ok().filter(|_| tok.len() == 1)
}

/// A complete set of nearest-neighbor parameters, indexed for O(1) lookup
/// during energy evaluation. `None` marks an entry the loaded file did not
/// provide (e.g. `INF` hairpin/bulge/interior loop sizes).
#[derive(Debug)]
pub struct NearestNeighborTables {
    pub stack: [[Option<i32>; P]; P],
    pub stack_enthalpies: [[Option<i32>; P]; P],

    pub mismatch_hairpin: [[[Option<i32>; B]; B]; P],
    pub mismatch_hairpin_enthalpies: [[[Option<i32>; B]; B]; P],
    pub mismatch_interior: [[[Option<i32>; B]; B]; P],
    pub mismatch_interior_enthalpies: [[[Option<i32>; B]; B]; P],
    pub mismatch_multi: [[[Option<i32>; B]; B]; P],
    pub mismatch_multi_enthalpies: [[[Option<i32>; B]; B]; P],
    pub mismatch_exterior: [[[Option<i32>; B]; B]; P],
    pub mismatch_exterior_enthalpies: [[[Option<i32>; B]; B]; P],

    pub dangle5: [[Option<i32>; B]; P],
    pub dangle5_enthalpies: [[Option<i32>; B]; P],
    pub dangle3: [[Option<i32>; B]; P],
    pub dangle3_enthalpies: [[Option<i32>; B]; P],

    /// 1x1 interior loop specials. 2x2 (and larger) loops fall back to the
    /// generic size/asymmetry formula instead of a tabulated `int22`: a real
    /// Turner int22 table runs to tens of thousands of entries, and the
    /// generic formula is what the model falls back to anyway once a loop
    /// exceeds the tabulated geometries (the "GAIL" rule).
    pub int11: Box<[[[[Option<i32>; B]; B]; P]; P]>,
    pub int11_enthalpies: Box<[[[[Option<i32>; B]; B]; P]; P]>,
    pub int21: Box<[[[[[Option<i32>; B]; B]; B]; P]; P]>,
    pub int21_enthalpies: Box<[[[[[Option<i32>; B]; B]; B]; P]; P]>,

    /// Index 0 is the `INF` sentinel for size 0 (never a valid loop size).
    pub hairpin: [Option<i32>; 31],
    pub hairpin_enthalpies: [Option<i32>; 31],
    pub bulge: [Option<i32>; 31],
    pub bulge_enthalpies: [Option<i32>; 31],
    pub interior: [Option<i32>; 31],
    pub interior_enthalpies: [Option<i32>; 31],

    /// `[closing, intern, ml_base, ...]` in file order; see [`crate::ml_params`].
    pub ml_params: [Option<i32>; 6],
    pub ninio: [Option<i32>; 3],
    pub misc: [Option<i32>; 4],

    pub triloops: AHashMap<Vec<Base>, (i32, i32)>,
    pub tetraloops: AHashMap<Vec<Base>, (i32, i32)>,
    pub hexaloops: AHashMap<Vec<Base>, (i32, i32)>,
}

impl NearestNeighborTables {
    pub fn empty() -> Self {
        NearestNeighborTables {
            stack: [[None; P]; P],
            stack_enthalpies: [[None; P]; P],
            mismatch_hairpin: [[[None; B]; B]; P],
            mismatch_hairpin_enthalpies: [[[None; B]; B]; P],
            mismatch_interior: [[[None; B]; B]; P],
            mismatch_interior_enthalpies: [[[None; B]; B]; P],
            mismatch_multi: [[[None; B]; B]; P],
            mismatch_multi_enthalpies: [[[None; B]; B]; P],
            mismatch_exterior: [[[None; B]; B]; P],
            mismatch_exterior_enthalpies: [[[None; B]; B]; P],
            dangle5: [[None; B]; P],
            dangle5_enthalpies: [[None; B]; P],
            dangle3: [[None; B]; P],
            dangle3_enthalpies: [[None; B]; P],
            int11: Box::new([[[[None; B]; B]; P]; P]),
            int11_enthalpies: Box::new([[[[None; B]; B]; P]; P]),
            int21: Box::new([[[[[None; B]; B]; B]; P]; P]),
            int21_enthalpies: Box::new([[[[[None; B]; B]; B]; P]; P]),
            hairpin: [None; 31],
            hairpin_enthalpies: [None; 31],
            bulge: [None; 31],
            bulge_enthalpies: [None; 31],
            interior: [None; 31],
            interior_enthalpies: [None; 31],
            ml_params: [None; 6],
            ninio: [None; 3],
            misc: [None; 4],
            triloops: AHashMap::new(),
            tetraloops: AHashMap::new(),
            hexaloops: AHashMap::new(),
        }
    }

    pub fn from_parameter_file<Pa: AsRef<Path>>(path: Pa) -> Result<Self, ParamError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_str(s: &str) -> Result<Self, ParamError> {
        Self::from_reader(std::io::Cursor::new(s))
    }

    fn from_reader<R: BufRead>(reader: R) -> Result<Self, ParamError> {
        let mut tables = Self::empty();
        let mut section: Option<String> = None;
        let mut pending: Vec<String> = Vec::new();

        let flush = |section: &Option<String>, pending: &mut Vec<String>, tables: &mut Self| -> Result<(), ParamError> {
            if let Some(name) = section {
                apply_section(name, pending, tables)?;
            }
            pending.clear();
            Ok(())
        };

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();
            let content = match line.split("/*").next() {
                Some(c) => c.trim(),
                None => line.trim(),
            };

            if content.is_empty() {
                continue;
            }

            if let Some(rest) = content.strip_prefix('#') {
                flush(&section, &mut pending, &mut tables)?;
                section = Some(rest.trim().to_string());
                continue;
            }

            if section.as_deref() == Some("END") {
                break;
            }

            pending.push(content.to_string());
        }
        flush(&section, &mut pending, &mut tables)?;
        Ok(tables)
    }
}

fn is_triplet_row(row: &str) -> bool {
    row.split_whitespace().count() == 3
}

fn apply_section(name: &str, rows: &[String], tables: &mut NearestNeighborTables) -> Result<(), ParamError> {
    match name {
        "END" => Ok(()),
        "stack" => apply_pair_table(rows, &mut tables.stack),
        "stack_enthalpies" => apply_pair_table(rows, &mut tables.stack_enthalpies),
        "mismatch_hairpin" => apply_mismatch_table(rows, &mut tables.mismatch_hairpin),
        "mismatch_hairpin_enthalpies" => apply_mismatch_table(rows, &mut tables.mismatch_hairpin_enthalpies),
        "mismatch_interior" => apply_mismatch_table(rows, &mut tables.mismatch_interior),
        "mismatch_interior_enthalpies" => apply_mismatch_table(rows, &mut tables.mismatch_interior_enthalpies),
        "mismatch_multi" => apply_mismatch_table(rows, &mut tables.mismatch_multi),
        "mismatch_multi_enthalpies" => apply_mismatch_table(rows, &mut tables.mismatch_multi_enthalpies),
        "mismatch_exterior" => apply_mismatch_table(rows, &mut tables.mismatch_exterior),
        "mismatch_exterior_enthalpies" => apply_mismatch_table(rows, &mut tables.mismatch_exterior_enthalpies),
        "dangle5" => apply_dangle_table(rows, &mut tables.dangle5),
        "dangle5_enthalpies" => apply_dangle_table(rows, &mut tables.dangle5_enthalpies),
        "dangle3" => apply_dangle_table(rows, &mut tables.dangle3),
        "dangle3_enthalpies" => apply_dangle_table(rows, &mut tables.dangle3_enthalpies),
        "int11" => apply_int11_table(rows, &mut tables.int11),
        "int11_enthalpies" => apply_int11_table(rows, &mut tables.int11_enthalpies),
        "int21" => apply_int21_table(rows, &mut tables.int21),
        "int21_enthalpies" => apply_int21_table(rows, &mut tables.int21_enthalpies),
        "hairpin" => apply_loop_table(rows, &mut tables.hairpin),
        "hairpin_enthalpies" => apply_loop_table(rows, &mut tables.hairpin_enthalpies),
        "bulge" => apply_loop_table(rows, &mut tables.bulge),
        "bulge_enthalpies" => apply_loop_table(rows, &mut tables.bulge_enthalpies),
        "interior" => apply_loop_table(rows, &mut tables.interior),
        "interior_enthalpies" => apply_loop_table(rows, &mut tables.interior_enthalpies),
        "ML_params" => apply_loop_table(rows, &mut tables.ml_params),
        "ML_params_enthalpies" => Ok(()), // no enthalpy-dependent ML rescaling modeled
        "NINIO" => apply_loop_table(rows, &mut tables.ninio),
        "NINIO_enthalpies" => Ok(()),
        "Misc" => apply_loop_table(rows, &mut tables.misc),
        "Misc_enthalpies" => Ok(()),
        "Triloops" => apply_sequence_table(rows, &mut tables.triloops),
        "Tetraloops" => apply_sequence_table(rows, &mut tables.tetraloops),
        "Hexaloops" => apply_sequence_table(rows, &mut tables.hexaloops),
        other => Err(ParamError::UnknownSection(other.to_string())),
    }
}

fn parse_i32(tok: &str, ctx: &str) -> Result<Option<i32>, ParamError> {
    if tok == "INF" || tok == "inf" {
        return Ok(None);
    }
    tok.parse::<i32>()
        .map(Some)
        .map_err(|_| ParamError::Parse(format!("expected integer in {}, got {:?}", ctx, tok)))
}

fn apply_pair_table(rows: &[String], field: &mut [[Option<i32>; P]; P]) -> Result<(), ParamError> {
    if rows.first().map(|r| is_triplet_row(r)).unwrap_or(false) {
        for row in rows {
            let toks: Vec<&str> = row.split_whitespace().collect();
            let (Some(p1), Some(p2)) = (resolve_pair(toks[0]), resolve_pair(toks[1])) else {
                return Err(ParamError::Parse(format!("unknown pair key in {:?}", row)));
            };
            field[p1 as usize][p2 as usize] = parse_i32(toks[2], "stack triplet")?;
        }
        return Ok(());
    }
    for (outer, row) in rows.iter().enumerate() {
        let i1 = PAIR_ORDER[outer] as usize;
        for (inner, tok) in row.split_whitespace().take(P).enumerate() {
            let i2 = PAIR_ORDER[inner] as usize;
            field[i1][i2] = parse_i32(tok, "stack block")?;
        }
    }
    Ok(())
}

fn apply_mismatch_table(rows: &[String], field: &mut [[[Option<i32>; B]; B]; P]) -> Result<(), ParamError> {
    let mut outer = 0;
    let mut m5 = 0;
    for row in rows {
        let i1 = PAIR_ORDER[outer] as usize;
        let i2 = BASE_ORDER[m5] as usize;
        for (m3, tok) in row.split_whitespace().take(B).enumerate() {
            let i3 = BASE_ORDER[m3] as usize;
            field[i1][i2][i3] = parse_i32(tok, "mismatch block")?;
        }
        m5 += 1;
        if m5 == B {
            m5 = 0;
            outer += 1;
        }
    }
    Ok(())
}

fn apply_dangle_table(rows: &[String], field: &mut [[Option<i32>; B]; P]) -> Result<(), ParamError> {
    if rows.first().map(|r| is_triplet_row(r)).unwrap_or(false) {
        for row in rows {
            let toks: Vec<&str> = row.split_whitespace().collect();
            let (Some(pt), Some(b)) = (resolve_pair(toks[0]), resolve_base(toks[1])) else {
                return Err(ParamError::Parse(format!("unknown dangle key in {:?}", row)));
            };
            field[pt as usize][b as usize] = parse_i32(toks[2], "dangle triplet")?;
        }
        return Ok(());
    }
    for (outer, row) in rows.iter().enumerate() {
        let i1 = PAIR_ORDER[outer] as usize;
        for (m5, tok) in row.split_whitespace().take(B).enumerate() {
            let i2 = BASE_ORDER[m5] as usize;
            field[i1][i2] = parse_i32(tok, "dangle block")?;
        }
    }
    Ok(())
}

fn apply_int11_table(rows: &[String], field: &mut [[[[Option<i32>; B]; B]; P]; P]) -> Result<(), ParamError> {
    let mut outer = 0;
    let mut inner = 0;
    let mut mm5 = 0;
    for row in rows {
        let i1 = PAIR_ORDER[outer] as usize;
        let i2 = PAIR_ORDER[inner] as usize;
        let i3 = BASE_ORDER[mm5] as usize;
        for (mm3, tok) in row.split_whitespace().take(B).enumerate() {
            let i4 = BASE_ORDER[mm3] as usize;
            field[i1][i2][i3][i4] = parse_i32(tok, "int11 block")?;
        }
        mm5 += 1;
        if mm5 == B {
            mm5 = 0;
            inner += 1;
        }
        if inner == P {
            inner = 0;
            outer += 1;
        }
    }
    Ok(())
}

fn apply_int21_table(rows: &[String], field: &mut [[[[[Option<i32>; B]; B]; B]; P]; P]) -> Result<(), ParamError> {
    let mut outer = 0;
    let mut inner = 0;
    let mut mm55 = 0;
    let mut mm53 = 0;
    for row in rows {
        let i1 = PAIR_ORDER[outer] as usize;
        let i2 = PAIR_ORDER[inner] as usize;
        let i3 = BASE_ORDER[mm55] as usize;
        let i4 = BASE_ORDER[mm53] as usize;
        for (mm3, tok) in row.split_whitespace().take(B).enumerate() {
            let i5 = BASE_ORDER[mm3] as usize;
            field[i1][i2][i3][i4][i5] = parse_i32(tok, "int21 block")?;
        }
        mm53 += 1;
        if mm53 == B {
            mm53 = 0;
            mm55 += 1;
        }
        if mm55 == B {
            mm55 = 0;
            inner += 1;
        }
        if inner == P {
            inner = 0;
            outer += 1;
        }
    }
    Ok(())
}

fn apply_loop_table<const N: usize>(rows: &[String], field: &mut [Option<i32>; N]) -> Result<(), ParamError> {
    let mut idx = 0;
    for row in rows {
        for tok in row.split_whitespace() {
            if idx >= N {
                return Err(ParamError::Parse(format!("too many entries for a {}-slot table", N)));
            }
            field[idx] = parse_i32(tok, "loop-size table")?;
            idx += 1;
        }
    }
    Ok(())
}

fn apply_sequence_table(rows: &[String], field: &mut AHashMap<Vec<Base>, (i32, i32)>) -> Result<(), ParamError> {
    for row in rows {
        let mut parts = row.split_whitespace();
        let (Some(seq), Some(g), Some(h)) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        let bases = NucleotideVec::try_from(seq)
            .map_err(|e| ParamError::Parse(format!("bad loop sequence {:?}: {}", seq, e)))?
            .0;
        let g = g.parse::<i32>().map_err(|_| ParamError::Parse(format!("bad bonus {:?}", g)))?;
        let h = h.parse::<i32>().map_err(|_| ParamError::Parse(format!("bad enthalpy {:?}", h)))?;
        field.insert(bases, (g, h));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stack_block_form() {
        let dummy = r#"
# stack
  -240  -330  -210  -140  -210  -210  -140
  -330  -340  -250  -150  -220  -240  -150
  -210  -250   130   -50  -140  -130   130
  -140  -150   -50    30   -60  -100    30
  -210  -220  -140   -60  -110   -90   -60
  -210  -240  -130  -100   -90  -130   -90
  -140  -150   130    30   -60   -90   130
"#;
        let tables = NearestNeighborTables::from_str(dummy).unwrap();
        assert_eq!(tables.stack[PairTypeRNA::CG as usize][PairTypeRNA::CG as usize], Some(-240));
        assert_eq!(tables.stack[PairTypeRNA::GC as usize][PairTypeRNA::CG as usize], Some(-330));
    }

    #[test]
    fn test_parse_stack_triplet_form() {
        let dummy = r#"
# stack
CG CG -240
GC CG -330
GU CG -210
"#;
        let tables = NearestNeighborTables::from_str(dummy).unwrap();
        assert_eq!(tables.stack[PairTypeRNA::CG as usize][PairTypeRNA::CG as usize], Some(-240));
        assert_eq!(tables.stack[PairTypeRNA::GC as usize][PairTypeRNA::CG as usize], Some(-330));
        assert_eq!(tables.stack[PairTypeRNA::UA as usize][PairTypeRNA::UA as usize], None);
    }

    #[test]
    fn test_parse_loop_table_with_inf() {
        let dummy = r#"
# hairpin
   INF   INF   INF   540   560   570   540   600   550   640
   650   660   670   680   690   690   700   710   710   720
   720   730   730   740   740   750   750   750   760   760
   770
"#;
        let tables = NearestNeighborTables::from_str(dummy).unwrap();
        assert_eq!(tables.hairpin[0], None);
        assert_eq!(tables.hairpin[3], Some(540));
        assert_eq!(tables.hairpin[30], Some(770));
    }

    #[test]
    fn test_parse_sequence_bonus() {
        let dummy = r#"
# Triloops
CAACG     680   2370
GUUAC     690   1080
"#;
        let tables = NearestNeighborTables::from_str(dummy).unwrap();
        assert_eq!(tables.triloops[&NucleotideVec::try_from("CAACG").unwrap().0], (680, 2370));
    }

    #[test]
    fn test_shipped_default_parameter_file_parses() {
        let tables = NearestNeighborTables::from_str(crate::parameters::DEFAULT_PARAMETER_FILE).unwrap();
        assert!(tables.stack[PairTypeRNA::CG as usize][PairTypeRNA::GC as usize].is_some());
        assert!(tables.hairpin[3].is_some());
    }

    #[test]
    fn test_unknown_section_is_an_error() {
        let dummy = "# bogus_section\n1 2 3\n";
        assert!(matches!(NearestNeighborTables::from_str(dummy), Err(ParamError::UnknownSection(_))));
    }
}
