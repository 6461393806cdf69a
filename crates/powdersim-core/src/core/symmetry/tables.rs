use super::SymmetryError;
use phf::{Map, phf_map};

/// Lattice centering of a space group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Centering {
    P,
    A,
    B,
    C,
    I,
    F,
    /// Rhombohedral lattice on hexagonal axes, obverse setting.
    R,
}

impl Centering {
    /// Pure translations of the centering, excluding the zero vector.
    pub fn translations(&self) -> &'static [[f64; 3]] {
        const THIRD: f64 = 1.0 / 3.0;
        const TWO_THIRDS: f64 = 2.0 / 3.0;
        match self {
            Centering::P => &[],
            Centering::A => &[[0.0, 0.5, 0.5]],
            Centering::B => &[[0.5, 0.0, 0.5]],
            Centering::C => &[[0.5, 0.5, 0.0]],
            Centering::I => &[[0.5, 0.5, 0.5]],
            Centering::F => &[[0.0, 0.5, 0.5], [0.5, 0.0, 0.5], [0.5, 0.5, 0.0]],
            Centering::R => &[
                [TWO_THIRDS, THIRD, THIRD],
                [THIRD, TWO_THIRDS, TWO_THIRDS],
            ],
        }
    }
}

/// One space-group setting of the International Tables.
#[derive(Debug)]
pub struct SpaceGroupEntry {
    /// International Tables number.
    pub number: u16,
    /// Hermann–Mauguin symbol in its conventional spacing.
    pub symbol: &'static str,
    /// Hall symbol giving the lattice and generators of this setting.
    pub hall: &'static str,
    /// For groups with several settings, the code chosen when none is given.
    pub default_setting: Option<&'static str>,
}

/// Space groups keyed by normalised short symbol (lower case, no whitespace or
/// underscores), with `symbol:code` keys for origin choices and rhombohedral axes.
/// Monoclinic groups are listed with unique axis b, plus the usual alternative cells.
pub static SPACE_GROUPS: Map<&'static str, SpaceGroupEntry> = phf_map! {
    // --- Triclinic ---
    "p1" => SpaceGroupEntry { number: 1, symbol: "P 1", hall: "P 1", default_setting: None },
    "p-1" => SpaceGroupEntry { number: 2, symbol: "P -1", hall: "-P 1", default_setting: None },

    // --- Monoclinic (unique axis b) ---
    "p2" => SpaceGroupEntry { number: 3, symbol: "P 1 2 1", hall: "P 2y", default_setting: None },
    "p21" => SpaceGroupEntry { number: 4, symbol: "P 1 21 1", hall: "P 2yb", default_setting: None },
    "c2" => SpaceGroupEntry { number: 5, symbol: "C 1 2 1", hall: "C 2y", default_setting: None },
    "i2" => SpaceGroupEntry { number: 5, symbol: "I 1 2 1", hall: "I 2y", default_setting: None },
    "pm" => SpaceGroupEntry { number: 6, symbol: "P 1 m 1", hall: "P -2y", default_setting: None },
    "pc" => SpaceGroupEntry { number: 7, symbol: "P 1 c 1", hall: "P -2yc", default_setting: None },
    "pn" => SpaceGroupEntry { number: 7, symbol: "P 1 n 1", hall: "P -2yac", default_setting: None },
    "cm" => SpaceGroupEntry { number: 8, symbol: "C 1 m 1", hall: "C -2y", default_setting: None },
    "cc" => SpaceGroupEntry { number: 9, symbol: "C 1 c 1", hall: "C -2yc", default_setting: None },
    "ia" => SpaceGroupEntry { number: 9, symbol: "I 1 a 1", hall: "I -2ya", default_setting: None },
    "p2/m" => SpaceGroupEntry { number: 10, symbol: "P 1 2/m 1", hall: "-P 2y", default_setting: None },
    "p21/m" => SpaceGroupEntry { number: 11, symbol: "P 1 21/m 1", hall: "-P 2yb", default_setting: None },
    "c2/m" => SpaceGroupEntry { number: 12, symbol: "C 1 2/m 1", hall: "-C 2y", default_setting: None },
    "i2/m" => SpaceGroupEntry { number: 12, symbol: "I 1 2/m 1", hall: "-I 2y", default_setting: None },
    "p2/c" => SpaceGroupEntry { number: 13, symbol: "P 1 2/c 1", hall: "-P 2yc", default_setting: None },
    "p2/n" => SpaceGroupEntry { number: 13, symbol: "P 1 2/n 1", hall: "-P 2yac", default_setting: None },
    "p21/c" => SpaceGroupEntry { number: 14, symbol: "P 1 21/c 1", hall: "-P 2ybc", default_setting: None },
    "p21/n" => SpaceGroupEntry { number: 14, symbol: "P 1 21/n 1", hall: "-P 2yn", default_setting: None },
    "p21/a" => SpaceGroupEntry { number: 14, symbol: "P 1 21/a 1", hall: "-P 2yab", default_setting: None },
    "c2/c" => SpaceGroupEntry { number: 15, symbol: "C 1 2/c 1", hall: "-C 2yc", default_setting: None },
    "i2/a" => SpaceGroupEntry { number: 15, symbol: "I 1 2/a 1", hall: "-I 2ya", default_setting: None },

    // --- Orthorhombic ---
    "p222" => SpaceGroupEntry { number: 16, symbol: "P 2 2 2", hall: "P 2 2", default_setting: None },
    "p2221" => SpaceGroupEntry { number: 17, symbol: "P 2 2 21", hall: "P 2c 2", default_setting: None },
    "p21212" => SpaceGroupEntry { number: 18, symbol: "P 21 21 2", hall: "P 2 2ab", default_setting: None },
    "p212121" => SpaceGroupEntry { number: 19, symbol: "P 21 21 21", hall: "P 2ac 2ab", default_setting: None },
    "c2221" => SpaceGroupEntry { number: 20, symbol: "C 2 2 21", hall: "C 2c 2", default_setting: None },
    "c222" => SpaceGroupEntry { number: 21, symbol: "C 2 2 2", hall: "C 2 2", default_setting: None },
    "f222" => SpaceGroupEntry { number: 22, symbol: "F 2 2 2", hall: "F 2 2", default_setting: None },
    "i222" => SpaceGroupEntry { number: 23, symbol: "I 2 2 2", hall: "I 2 2", default_setting: None },
    "i212121" => SpaceGroupEntry { number: 24, symbol: "I 21 21 21", hall: "I 2b 2c", default_setting: None },
    "pmm2" => SpaceGroupEntry { number: 25, symbol: "P m m 2", hall: "P 2 -2", default_setting: None },
    "pmc21" => SpaceGroupEntry { number: 26, symbol: "P m c 21", hall: "P 2c -2", default_setting: None },
    "pcc2" => SpaceGroupEntry { number: 27, symbol: "P c c 2", hall: "P 2 -2c", default_setting: None },
    "pma2" => SpaceGroupEntry { number: 28, symbol: "P m a 2", hall: "P 2 -2a", default_setting: None },
    "pca21" => SpaceGroupEntry { number: 29, symbol: "P c a 21", hall: "P 2c -2ac", default_setting: None },
    "pnc2" => SpaceGroupEntry { number: 30, symbol: "P n c 2", hall: "P 2 -2bc", default_setting: None },
    "pmn21" => SpaceGroupEntry { number: 31, symbol: "P m n 21", hall: "P 2ac -2", default_setting: None },
    "pba2" => SpaceGroupEntry { number: 32, symbol: "P b a 2", hall: "P 2 -2ab", default_setting: None },
    "pna21" => SpaceGroupEntry { number: 33, symbol: "P n a 21", hall: "P 2c -2n", default_setting: None },
    "pnn2" => SpaceGroupEntry { number: 34, symbol: "P n n 2", hall: "P 2 -2n", default_setting: None },
    "cmm2" => SpaceGroupEntry { number: 35, symbol: "C m m 2", hall: "C 2 -2", default_setting: None },
    "cmc21" => SpaceGroupEntry { number: 36, symbol: "C m c 21", hall: "C 2c -2", default_setting: None },
    "ccc2" => SpaceGroupEntry { number: 37, symbol: "C c c 2", hall: "C 2 -2c", default_setting: None },
    "amm2" => SpaceGroupEntry { number: 38, symbol: "A m m 2", hall: "A 2 -2", default_setting: None },
    "aem2" => SpaceGroupEntry { number: 39, symbol: "A e m 2", hall: "A 2 -2c", default_setting: None },
    "ama2" => SpaceGroupEntry { number: 40, symbol: "A m a 2", hall: "A 2 -2a", default_setting: None },
    "aea2" => SpaceGroupEntry { number: 41, symbol: "A e a 2", hall: "A 2 -2ac", default_setting: None },
    "fmm2" => SpaceGroupEntry { number: 42, symbol: "F m m 2", hall: "F 2 -2", default_setting: None },
    "fdd2" => SpaceGroupEntry { number: 43, symbol: "F d d 2", hall: "F 2 -2d", default_setting: None },
    "imm2" => SpaceGroupEntry { number: 44, symbol: "I m m 2", hall: "I 2 -2", default_setting: None },
    "iba2" => SpaceGroupEntry { number: 45, symbol: "I b a 2", hall: "I 2 -2c", default_setting: None },
    "ima2" => SpaceGroupEntry { number: 46, symbol: "I m a 2", hall: "I 2 -2a", default_setting: None },
    "pmmm" => SpaceGroupEntry { number: 47, symbol: "P m m m", hall: "-P 2 2", default_setting: None },
    "pnnn:1" => SpaceGroupEntry { number: 48, symbol: "P n n n", hall: "P 2 2 -1n", default_setting: Some("2") },
    "pnnn" => SpaceGroupEntry { number: 48, symbol: "P n n n", hall: "-P 2ab 2bc", default_setting: Some("2") },
    "pnnn:2" => SpaceGroupEntry { number: 48, symbol: "P n n n", hall: "-P 2ab 2bc", default_setting: Some("2") },
    "pccm" => SpaceGroupEntry { number: 49, symbol: "P c c m", hall: "-P 2 2c", default_setting: None },
    "pban:1" => SpaceGroupEntry { number: 50, symbol: "P b a n", hall: "P 2 2 -1ab", default_setting: Some("2") },
    "pban" => SpaceGroupEntry { number: 50, symbol: "P b a n", hall: "-P 2ab 2b", default_setting: Some("2") },
    "pban:2" => SpaceGroupEntry { number: 50, symbol: "P b a n", hall: "-P 2ab 2b", default_setting: Some("2") },
    "pmma" => SpaceGroupEntry { number: 51, symbol: "P m m a", hall: "-P 2a 2a", default_setting: None },
    "pnna" => SpaceGroupEntry { number: 52, symbol: "P n n a", hall: "-P 2a 2bc", default_setting: None },
    "pmna" => SpaceGroupEntry { number: 53, symbol: "P m n a", hall: "-P 2ac 2", default_setting: None },
    "pcca" => SpaceGroupEntry { number: 54, symbol: "P c c a", hall: "-P 2a 2ac", default_setting: None },
    "pbam" => SpaceGroupEntry { number: 55, symbol: "P b a m", hall: "-P 2 2ab", default_setting: None },
    "pccn" => SpaceGroupEntry { number: 56, symbol: "P c c n", hall: "-P 2ab 2ac", default_setting: None },
    "pbcm" => SpaceGroupEntry { number: 57, symbol: "P b c m", hall: "-P 2c 2b", default_setting: None },
    "pnnm" => SpaceGroupEntry { number: 58, symbol: "P n n m", hall: "-P 2 2n", default_setting: None },
    "pmmn:1" => SpaceGroupEntry { number: 59, symbol: "P m m n", hall: "P 2 2ab -1ab", default_setting: Some("2") },
    "pmmn" => SpaceGroupEntry { number: 59, symbol: "P m m n", hall: "-P 2ab 2a", default_setting: Some("2") },
    "pmmn:2" => SpaceGroupEntry { number: 59, symbol: "P m m n", hall: "-P 2ab 2a", default_setting: Some("2") },
    "pbcn" => SpaceGroupEntry { number: 60, symbol: "P b c n", hall: "-P 2n 2ab", default_setting: None },
    "pbca" => SpaceGroupEntry { number: 61, symbol: "P b c a", hall: "-P 2ac 2ab", default_setting: None },
    "pnma" => SpaceGroupEntry { number: 62, symbol: "P n m a", hall: "-P 2ac 2n", default_setting: None },
    "cmcm" => SpaceGroupEntry { number: 63, symbol: "C m c m", hall: "-C 2c 2", default_setting: None },
    "cmce" => SpaceGroupEntry { number: 64, symbol: "C m c e", hall: "-C 2bc 2", default_setting: None },
    "cmmm" => SpaceGroupEntry { number: 65, symbol: "C m m m", hall: "-C 2 2", default_setting: None },
    "cccm" => SpaceGroupEntry { number: 66, symbol: "C c c m", hall: "-C 2 2c", default_setting: None },
    "cmme" => SpaceGroupEntry { number: 67, symbol: "C m m e", hall: "-C 2b 2", default_setting: None },
    "ccce:1" => SpaceGroupEntry { number: 68, symbol: "C c c e", hall: "C 2 2 -1bc", default_setting: Some("2") },
    "ccce" => SpaceGroupEntry { number: 68, symbol: "C c c e", hall: "-C 2b 2bc", default_setting: Some("2") },
    "ccce:2" => SpaceGroupEntry { number: 68, symbol: "C c c e", hall: "-C 2b 2bc", default_setting: Some("2") },
    "fmmm" => SpaceGroupEntry { number: 69, symbol: "F m m m", hall: "-F 2 2", default_setting: None },
    "fddd:1" => SpaceGroupEntry { number: 70, symbol: "F d d d", hall: "F 2 2 -1d", default_setting: Some("2") },
    "fddd" => SpaceGroupEntry { number: 70, symbol: "F d d d", hall: "-F 2uv 2vw", default_setting: Some("2") },
    "fddd:2" => SpaceGroupEntry { number: 70, symbol: "F d d d", hall: "-F 2uv 2vw", default_setting: Some("2") },
    "immm" => SpaceGroupEntry { number: 71, symbol: "I m m m", hall: "-I 2 2", default_setting: None },
    "ibam" => SpaceGroupEntry { number: 72, symbol: "I b a m", hall: "-I 2 2c", default_setting: None },
    "ibca" => SpaceGroupEntry { number: 73, symbol: "I b c a", hall: "-I 2b 2c", default_setting: None },
    "imma" => SpaceGroupEntry { number: 74, symbol: "I m m a", hall: "-I 2b 2", default_setting: None },

    // --- Tetragonal ---
    "p4" => SpaceGroupEntry { number: 75, symbol: "P 4", hall: "P 4", default_setting: None },
    "p41" => SpaceGroupEntry { number: 76, symbol: "P 41", hall: "P 4w", default_setting: None },
    "p42" => SpaceGroupEntry { number: 77, symbol: "P 42", hall: "P 4c", default_setting: None },
    "p43" => SpaceGroupEntry { number: 78, symbol: "P 43", hall: "P 4cw", default_setting: None },
    "i4" => SpaceGroupEntry { number: 79, symbol: "I 4", hall: "I 4", default_setting: None },
    "i41" => SpaceGroupEntry { number: 80, symbol: "I 41", hall: "I 4bw", default_setting: None },
    "p-4" => SpaceGroupEntry { number: 81, symbol: "P -4", hall: "P -4", default_setting: None },
    "i-4" => SpaceGroupEntry { number: 82, symbol: "I -4", hall: "I -4", default_setting: None },
    "p4/m" => SpaceGroupEntry { number: 83, symbol: "P 4/m", hall: "-P 4", default_setting: None },
    "p42/m" => SpaceGroupEntry { number: 84, symbol: "P 42/m", hall: "-P 4c", default_setting: None },
    "p4/n:1" => SpaceGroupEntry { number: 85, symbol: "P 4/n", hall: "P 4ab -1ab", default_setting: Some("2") },
    "p4/n" => SpaceGroupEntry { number: 85, symbol: "P 4/n", hall: "-P 4a", default_setting: Some("2") },
    "p4/n:2" => SpaceGroupEntry { number: 85, symbol: "P 4/n", hall: "-P 4a", default_setting: Some("2") },
    "p42/n:1" => SpaceGroupEntry { number: 86, symbol: "P 42/n", hall: "P 4n -1n", default_setting: Some("2") },
    "p42/n" => SpaceGroupEntry { number: 86, symbol: "P 42/n", hall: "-P 4bc", default_setting: Some("2") },
    "p42/n:2" => SpaceGroupEntry { number: 86, symbol: "P 42/n", hall: "-P 4bc", default_setting: Some("2") },
    "i4/m" => SpaceGroupEntry { number: 87, symbol: "I 4/m", hall: "-I 4", default_setting: None },
    "i41/a:1" => SpaceGroupEntry { number: 88, symbol: "I 41/a", hall: "I 4bw -1bw", default_setting: Some("2") },
    "i41/a" => SpaceGroupEntry { number: 88, symbol: "I 41/a", hall: "-I 4ad", default_setting: Some("2") },
    "i41/a:2" => SpaceGroupEntry { number: 88, symbol: "I 41/a", hall: "-I 4ad", default_setting: Some("2") },
    "p422" => SpaceGroupEntry { number: 89, symbol: "P 4 2 2", hall: "P 4 2", default_setting: None },
    "p4212" => SpaceGroupEntry { number: 90, symbol: "P 4 21 2", hall: "P 4ab 2ab", default_setting: None },
    "p4122" => SpaceGroupEntry { number: 91, symbol: "P 41 2 2", hall: "P 4w 2c", default_setting: None },
    "p41212" => SpaceGroupEntry { number: 92, symbol: "P 41 21 2", hall: "P 4abw 2nw", default_setting: None },
    "p4222" => SpaceGroupEntry { number: 93, symbol: "P 42 2 2", hall: "P 4c 2", default_setting: None },
    "p42212" => SpaceGroupEntry { number: 94, symbol: "P 42 21 2", hall: "P 4n 2n", default_setting: None },
    "p4322" => SpaceGroupEntry { number: 95, symbol: "P 43 2 2", hall: "P 4cw 2c", default_setting: None },
    "p43212" => SpaceGroupEntry { number: 96, symbol: "P 43 21 2", hall: "P 4nw 2abw", default_setting: None },
    "i422" => SpaceGroupEntry { number: 97, symbol: "I 4 2 2", hall: "I 4 2", default_setting: None },
    "i4122" => SpaceGroupEntry { number: 98, symbol: "I 41 2 2", hall: "I 4bw 2bw", default_setting: None },
    "p4mm" => SpaceGroupEntry { number: 99, symbol: "P 4 m m", hall: "P 4 -2", default_setting: None },
    "p4bm" => SpaceGroupEntry { number: 100, symbol: "P 4 b m", hall: "P 4 -2ab", default_setting: None },
    "p42cm" => SpaceGroupEntry { number: 101, symbol: "P 42 c m", hall: "P 4c -2c", default_setting: None },
    "p42nm" => SpaceGroupEntry { number: 102, symbol: "P 42 n m", hall: "P 4n -2n", default_setting: None },
    "p4cc" => SpaceGroupEntry { number: 103, symbol: "P 4 c c", hall: "P 4 -2c", default_setting: None },
    "p4nc" => SpaceGroupEntry { number: 104, symbol: "P 4 n c", hall: "P 4 -2n", default_setting: None },
    "p42mc" => SpaceGroupEntry { number: 105, symbol: "P 42 m c", hall: "P 4c -2", default_setting: None },
    "p42bc" => SpaceGroupEntry { number: 106, symbol: "P 42 b c", hall: "P 4c -2ab", default_setting: None },
    "i4mm" => SpaceGroupEntry { number: 107, symbol: "I 4 m m", hall: "I 4 -2", default_setting: None },
    "i4cm" => SpaceGroupEntry { number: 108, symbol: "I 4 c m", hall: "I 4 -2c", default_setting: None },
    "i41md" => SpaceGroupEntry { number: 109, symbol: "I 41 m d", hall: "I 4bw -2", default_setting: None },
    "i41cd" => SpaceGroupEntry { number: 110, symbol: "I 41 c d", hall: "I 4bw -2c", default_setting: None },
    "p-42m" => SpaceGroupEntry { number: 111, symbol: "P -4 2 m", hall: "P -4 2", default_setting: None },
    "p-42c" => SpaceGroupEntry { number: 112, symbol: "P -4 2 c", hall: "P -4 2c", default_setting: None },
    "p-421m" => SpaceGroupEntry { number: 113, symbol: "P -4 21 m", hall: "P -4 2ab", default_setting: None },
    "p-421c" => SpaceGroupEntry { number: 114, symbol: "P -4 21 c", hall: "P -4 2n", default_setting: None },
    "p-4m2" => SpaceGroupEntry { number: 115, symbol: "P -4 m 2", hall: "P -4 -2", default_setting: None },
    "p-4c2" => SpaceGroupEntry { number: 116, symbol: "P -4 c 2", hall: "P -4 -2c", default_setting: None },
    "p-4b2" => SpaceGroupEntry { number: 117, symbol: "P -4 b 2", hall: "P -4 -2ab", default_setting: None },
    "p-4n2" => SpaceGroupEntry { number: 118, symbol: "P -4 n 2", hall: "P -4 -2n", default_setting: None },
    "i-4m2" => SpaceGroupEntry { number: 119, symbol: "I -4 m 2", hall: "I -4 -2", default_setting: None },
    "i-4c2" => SpaceGroupEntry { number: 120, symbol: "I -4 c 2", hall: "I -4 -2c", default_setting: None },
    "i-42m" => SpaceGroupEntry { number: 121, symbol: "I -4 2 m", hall: "I -4 2", default_setting: None },
    "i-42d" => SpaceGroupEntry { number: 122, symbol: "I -4 2 d", hall: "I -4 2bw", default_setting: None },
    "p4/mmm" => SpaceGroupEntry { number: 123, symbol: "P 4/m m m", hall: "-P 4 2", default_setting: None },
    "p4/mcc" => SpaceGroupEntry { number: 124, symbol: "P 4/m c c", hall: "-P 4 2c", default_setting: None },
    "p4/nbm:1" => SpaceGroupEntry { number: 125, symbol: "P 4/n b m", hall: "P 4 2 -1ab", default_setting: Some("2") },
    "p4/nbm" => SpaceGroupEntry { number: 125, symbol: "P 4/n b m", hall: "-P 4a 2b", default_setting: Some("2") },
    "p4/nbm:2" => SpaceGroupEntry { number: 125, symbol: "P 4/n b m", hall: "-P 4a 2b", default_setting: Some("2") },
    "p4/nnc:1" => SpaceGroupEntry { number: 126, symbol: "P 4/n n c", hall: "P 4 2 -1n", default_setting: Some("2") },
    "p4/nnc" => SpaceGroupEntry { number: 126, symbol: "P 4/n n c", hall: "-P 4a 2bc", default_setting: Some("2") },
    "p4/nnc:2" => SpaceGroupEntry { number: 126, symbol: "P 4/n n c", hall: "-P 4a 2bc", default_setting: Some("2") },
    "p4/mbm" => SpaceGroupEntry { number: 127, symbol: "P 4/m b m", hall: "-P 4 2ab", default_setting: None },
    "p4/mnc" => SpaceGroupEntry { number: 128, symbol: "P 4/m n c", hall: "-P 4 2n", default_setting: None },
    "p4/nmm:1" => SpaceGroupEntry { number: 129, symbol: "P 4/n m m", hall: "P 4ab 2ab -1ab", default_setting: Some("2") },
    "p4/nmm" => SpaceGroupEntry { number: 129, symbol: "P 4/n m m", hall: "-P 4a 2a", default_setting: Some("2") },
    "p4/nmm:2" => SpaceGroupEntry { number: 129, symbol: "P 4/n m m", hall: "-P 4a 2a", default_setting: Some("2") },
    "p4/ncc:1" => SpaceGroupEntry { number: 130, symbol: "P 4/n c c", hall: "P 4ab 2n -1ab", default_setting: Some("2") },
    "p4/ncc" => SpaceGroupEntry { number: 130, symbol: "P 4/n c c", hall: "-P 4a 2ac", default_setting: Some("2") },
    "p4/ncc:2" => SpaceGroupEntry { number: 130, symbol: "P 4/n c c", hall: "-P 4a 2ac", default_setting: Some("2") },
    "p42/mmc" => SpaceGroupEntry { number: 131, symbol: "P 42/m m c", hall: "-P 4c 2", default_setting: None },
    "p42/mcm" => SpaceGroupEntry { number: 132, symbol: "P 42/m c m", hall: "-P 4c 2c", default_setting: None },
    "p42/nbc:1" => SpaceGroupEntry { number: 133, symbol: "P 42/n b c", hall: "P 4n 2c -1n", default_setting: Some("2") },
    "p42/nbc" => SpaceGroupEntry { number: 133, symbol: "P 42/n b c", hall: "-P 4ac 2b", default_setting: Some("2") },
    "p42/nbc:2" => SpaceGroupEntry { number: 133, symbol: "P 42/n b c", hall: "-P 4ac 2b", default_setting: Some("2") },
    "p42/nnm:1" => SpaceGroupEntry { number: 134, symbol: "P 42/n n m", hall: "P 4n 2 -1n", default_setting: Some("2") },
    "p42/nnm" => SpaceGroupEntry { number: 134, symbol: "P 42/n n m", hall: "-P 4ac 2bc", default_setting: Some("2") },
    "p42/nnm:2" => SpaceGroupEntry { number: 134, symbol: "P 42/n n m", hall: "-P 4ac 2bc", default_setting: Some("2") },
    "p42/mbc" => SpaceGroupEntry { number: 135, symbol: "P 42/m b c", hall: "-P 4c 2ab", default_setting: None },
    "p42/mnm" => SpaceGroupEntry { number: 136, symbol: "P 42/m n m", hall: "-P 4n 2n", default_setting: None },
    "p42/nmc:1" => SpaceGroupEntry { number: 137, symbol: "P 42/n m c", hall: "P 4n 2n -1n", default_setting: Some("2") },
    "p42/nmc" => SpaceGroupEntry { number: 137, symbol: "P 42/n m c", hall: "-P 4ac 2a", default_setting: Some("2") },
    "p42/nmc:2" => SpaceGroupEntry { number: 137, symbol: "P 42/n m c", hall: "-P 4ac 2a", default_setting: Some("2") },
    "p42/ncm:1" => SpaceGroupEntry { number: 138, symbol: "P 42/n c m", hall: "P 4n 2ab -1n", default_setting: Some("2") },
    "p42/ncm" => SpaceGroupEntry { number: 138, symbol: "P 42/n c m", hall: "-P 4ac 2ac", default_setting: Some("2") },
    "p42/ncm:2" => SpaceGroupEntry { number: 138, symbol: "P 42/n c m", hall: "-P 4ac 2ac", default_setting: Some("2") },
    "i4/mmm" => SpaceGroupEntry { number: 139, symbol: "I 4/m m m", hall: "-I 4 2", default_setting: None },
    "i4/mcm" => SpaceGroupEntry { number: 140, symbol: "I 4/m c m", hall: "-I 4 2c", default_setting: None },
    "i41/amd:1" => SpaceGroupEntry { number: 141, symbol: "I 41/a m d", hall: "I 4bw 2bw -1bw", default_setting: Some("2") },
    "i41/amd" => SpaceGroupEntry { number: 141, symbol: "I 41/a m d", hall: "-I 4bd 2", default_setting: Some("2") },
    "i41/amd:2" => SpaceGroupEntry { number: 141, symbol: "I 41/a m d", hall: "-I 4bd 2", default_setting: Some("2") },
    "i41/acd:1" => SpaceGroupEntry { number: 142, symbol: "I 41/a c d", hall: "I 4bw 2aw -1bw", default_setting: Some("2") },
    "i41/acd" => SpaceGroupEntry { number: 142, symbol: "I 41/a c d", hall: "-I 4bd 2c", default_setting: Some("2") },
    "i41/acd:2" => SpaceGroupEntry { number: 142, symbol: "I 41/a c d", hall: "-I 4bd 2c", default_setting: Some("2") },

    // --- Trigonal ---
    "p3" => SpaceGroupEntry { number: 143, symbol: "P 3", hall: "P 3", default_setting: None },
    "p31" => SpaceGroupEntry { number: 144, symbol: "P 31", hall: "P 31", default_setting: None },
    "p32" => SpaceGroupEntry { number: 145, symbol: "P 32", hall: "P 32", default_setting: None },
    "r3" => SpaceGroupEntry { number: 146, symbol: "R 3", hall: "R 3", default_setting: Some("h") },
    "r3:h" => SpaceGroupEntry { number: 146, symbol: "R 3", hall: "R 3", default_setting: Some("h") },
    "r3:r" => SpaceGroupEntry { number: 146, symbol: "R 3", hall: "P 3*", default_setting: Some("h") },
    "p-3" => SpaceGroupEntry { number: 147, symbol: "P -3", hall: "-P 3", default_setting: None },
    "r-3" => SpaceGroupEntry { number: 148, symbol: "R -3", hall: "-R 3", default_setting: Some("h") },
    "r-3:h" => SpaceGroupEntry { number: 148, symbol: "R -3", hall: "-R 3", default_setting: Some("h") },
    "r-3:r" => SpaceGroupEntry { number: 148, symbol: "R -3", hall: "-P 3*", default_setting: Some("h") },
    "p312" => SpaceGroupEntry { number: 149, symbol: "P 3 1 2", hall: "P 3 2", default_setting: None },
    "p321" => SpaceGroupEntry { number: 150, symbol: "P 3 2 1", hall: "P 3 2\"", default_setting: None },
    "p3112" => SpaceGroupEntry { number: 151, symbol: "P 31 1 2", hall: "P 31 2c (0 0 1)", default_setting: None },
    "p3121" => SpaceGroupEntry { number: 152, symbol: "P 31 2 1", hall: "P 31 2\"", default_setting: None },
    "p3212" => SpaceGroupEntry { number: 153, symbol: "P 32 1 2", hall: "P 32 2c (0 0 -1)", default_setting: None },
    "p3221" => SpaceGroupEntry { number: 154, symbol: "P 32 2 1", hall: "P 32 2\"", default_setting: None },
    "r32" => SpaceGroupEntry { number: 155, symbol: "R 3 2", hall: "R 3 2\"", default_setting: Some("h") },
    "r32:h" => SpaceGroupEntry { number: 155, symbol: "R 3 2", hall: "R 3 2\"", default_setting: Some("h") },
    "r32:r" => SpaceGroupEntry { number: 155, symbol: "R 3 2", hall: "P 3* 2", default_setting: Some("h") },
    "p3m1" => SpaceGroupEntry { number: 156, symbol: "P 3 m 1", hall: "P 3 -2\"", default_setting: None },
    "p31m" => SpaceGroupEntry { number: 157, symbol: "P 3 1 m", hall: "P 3 -2", default_setting: None },
    "p3c1" => SpaceGroupEntry { number: 158, symbol: "P 3 c 1", hall: "P 3 -2\"c", default_setting: None },
    "p31c" => SpaceGroupEntry { number: 159, symbol: "P 3 1 c", hall: "P 3 -2c", default_setting: None },
    "r3m" => SpaceGroupEntry { number: 160, symbol: "R 3 m", hall: "R 3 -2\"", default_setting: Some("h") },
    "r3m:h" => SpaceGroupEntry { number: 160, symbol: "R 3 m", hall: "R 3 -2\"", default_setting: Some("h") },
    "r3m:r" => SpaceGroupEntry { number: 160, symbol: "R 3 m", hall: "P 3* -2", default_setting: Some("h") },
    "r3c" => SpaceGroupEntry { number: 161, symbol: "R 3 c", hall: "R 3 -2\"c", default_setting: Some("h") },
    "r3c:h" => SpaceGroupEntry { number: 161, symbol: "R 3 c", hall: "R 3 -2\"c", default_setting: Some("h") },
    "r3c:r" => SpaceGroupEntry { number: 161, symbol: "R 3 c", hall: "P 3* -2n", default_setting: Some("h") },
    "p-31m" => SpaceGroupEntry { number: 162, symbol: "P -3 1 m", hall: "-P 3 2", default_setting: None },
    "p-31c" => SpaceGroupEntry { number: 163, symbol: "P -3 1 c", hall: "-P 3 2c", default_setting: None },
    "p-3m1" => SpaceGroupEntry { number: 164, symbol: "P -3 m 1", hall: "-P 3 2\"", default_setting: None },
    "p-3c1" => SpaceGroupEntry { number: 165, symbol: "P -3 c 1", hall: "-P 3 2\"c", default_setting: None },
    "r-3m" => SpaceGroupEntry { number: 166, symbol: "R -3 m", hall: "-R 3 2\"", default_setting: Some("h") },
    "r-3m:h" => SpaceGroupEntry { number: 166, symbol: "R -3 m", hall: "-R 3 2\"", default_setting: Some("h") },
    "r-3m:r" => SpaceGroupEntry { number: 166, symbol: "R -3 m", hall: "-P 3* 2", default_setting: Some("h") },
    "r-3c" => SpaceGroupEntry { number: 167, symbol: "R -3 c", hall: "-R 3 2\"c", default_setting: Some("h") },
    "r-3c:h" => SpaceGroupEntry { number: 167, symbol: "R -3 c", hall: "-R 3 2\"c", default_setting: Some("h") },
    "r-3c:r" => SpaceGroupEntry { number: 167, symbol: "R -3 c", hall: "-P 3* 2n", default_setting: Some("h") },

    // --- Hexagonal ---
    "p6" => SpaceGroupEntry { number: 168, symbol: "P 6", hall: "P 6", default_setting: None },
    "p61" => SpaceGroupEntry { number: 169, symbol: "P 61", hall: "P 61", default_setting: None },
    "p65" => SpaceGroupEntry { number: 170, symbol: "P 65", hall: "P 65", default_setting: None },
    "p62" => SpaceGroupEntry { number: 171, symbol: "P 62", hall: "P 62", default_setting: None },
    "p64" => SpaceGroupEntry { number: 172, symbol: "P 64", hall: "P 64", default_setting: None },
    "p63" => SpaceGroupEntry { number: 173, symbol: "P 63", hall: "P 6c", default_setting: None },
    "p-6" => SpaceGroupEntry { number: 174, symbol: "P -6", hall: "P -6", default_setting: None },
    "p6/m" => SpaceGroupEntry { number: 175, symbol: "P 6/m", hall: "-P 6", default_setting: None },
    "p63/m" => SpaceGroupEntry { number: 176, symbol: "P 63/m", hall: "-P 6c", default_setting: None },
    "p622" => SpaceGroupEntry { number: 177, symbol: "P 6 2 2", hall: "P 6 2", default_setting: None },
    "p6122" => SpaceGroupEntry { number: 178, symbol: "P 61 2 2", hall: "P 61 2 (0 0 -1)", default_setting: None },
    "p6522" => SpaceGroupEntry { number: 179, symbol: "P 65 2 2", hall: "P 65 2 (0 0 1)", default_setting: None },
    "p6222" => SpaceGroupEntry { number: 180, symbol: "P 62 2 2", hall: "P 62 2c (0 0 1)", default_setting: None },
    "p6422" => SpaceGroupEntry { number: 181, symbol: "P 64 2 2", hall: "P 64 2c (0 0 -1)", default_setting: None },
    "p6322" => SpaceGroupEntry { number: 182, symbol: "P 63 2 2", hall: "P 6c 2c", default_setting: None },
    "p6mm" => SpaceGroupEntry { number: 183, symbol: "P 6 m m", hall: "P 6 -2", default_setting: None },
    "p6cc" => SpaceGroupEntry { number: 184, symbol: "P 6 c c", hall: "P 6 -2c", default_setting: None },
    "p63cm" => SpaceGroupEntry { number: 185, symbol: "P 63 c m", hall: "P 6c -2", default_setting: None },
    "p63mc" => SpaceGroupEntry { number: 186, symbol: "P 63 m c", hall: "P 6c -2c", default_setting: None },
    "p-6m2" => SpaceGroupEntry { number: 187, symbol: "P -6 m 2", hall: "P -6 2", default_setting: None },
    "p-6c2" => SpaceGroupEntry { number: 188, symbol: "P -6 c 2", hall: "P -6c 2", default_setting: None },
    "p-62m" => SpaceGroupEntry { number: 189, symbol: "P -6 2 m", hall: "P -6 -2", default_setting: None },
    "p-62c" => SpaceGroupEntry { number: 190, symbol: "P -6 2 c", hall: "P -6c -2c", default_setting: None },
    "p6/mmm" => SpaceGroupEntry { number: 191, symbol: "P 6/m m m", hall: "-P 6 2", default_setting: None },
    "p6/mcc" => SpaceGroupEntry { number: 192, symbol: "P 6/m c c", hall: "-P 6 2c", default_setting: None },
    "p63/mcm" => SpaceGroupEntry { number: 193, symbol: "P 63/m c m", hall: "-P 6c 2", default_setting: None },
    "p63/mmc" => SpaceGroupEntry { number: 194, symbol: "P 63/m m c", hall: "-P 6c 2c", default_setting: None },

    // --- Cubic ---
    "p23" => SpaceGroupEntry { number: 195, symbol: "P 2 3", hall: "P 2 2 3", default_setting: None },
    "f23" => SpaceGroupEntry { number: 196, symbol: "F 2 3", hall: "F 2 2 3", default_setting: None },
    "i23" => SpaceGroupEntry { number: 197, symbol: "I 2 3", hall: "I 2 2 3", default_setting: None },
    "p213" => SpaceGroupEntry { number: 198, symbol: "P 21 3", hall: "P 2ac 2ab 3", default_setting: None },
    "i213" => SpaceGroupEntry { number: 199, symbol: "I 21 3", hall: "I 2b 2c 3", default_setting: None },
    "pm-3" => SpaceGroupEntry { number: 200, symbol: "P m -3", hall: "-P 2 2 3", default_setting: None },
    "pn-3:1" => SpaceGroupEntry { number: 201, symbol: "P n -3", hall: "P 2 2 3 -1n", default_setting: Some("2") },
    "pn-3" => SpaceGroupEntry { number: 201, symbol: "P n -3", hall: "-P 2ab 2bc 3", default_setting: Some("2") },
    "pn-3:2" => SpaceGroupEntry { number: 201, symbol: "P n -3", hall: "-P 2ab 2bc 3", default_setting: Some("2") },
    "fm-3" => SpaceGroupEntry { number: 202, symbol: "F m -3", hall: "-F 2 2 3", default_setting: None },
    "fd-3:1" => SpaceGroupEntry { number: 203, symbol: "F d -3", hall: "F 2 2 3 -1d", default_setting: Some("2") },
    "fd-3" => SpaceGroupEntry { number: 203, symbol: "F d -3", hall: "-F 2uv 2vw 3", default_setting: Some("2") },
    "fd-3:2" => SpaceGroupEntry { number: 203, symbol: "F d -3", hall: "-F 2uv 2vw 3", default_setting: Some("2") },
    "im-3" => SpaceGroupEntry { number: 204, symbol: "I m -3", hall: "-I 2 2 3", default_setting: None },
    "pa-3" => SpaceGroupEntry { number: 205, symbol: "P a -3", hall: "-P 2ac 2ab 3", default_setting: None },
    "ia-3" => SpaceGroupEntry { number: 206, symbol: "I a -3", hall: "-I 2b 2c 3", default_setting: None },
    "p432" => SpaceGroupEntry { number: 207, symbol: "P 4 3 2", hall: "P 4 2 3", default_setting: None },
    "p4232" => SpaceGroupEntry { number: 208, symbol: "P 42 3 2", hall: "P 4n 2 3", default_setting: None },
    "f432" => SpaceGroupEntry { number: 209, symbol: "F 4 3 2", hall: "F 4 2 3", default_setting: None },
    "f4132" => SpaceGroupEntry { number: 210, symbol: "F 41 3 2", hall: "F 4d 2 3", default_setting: None },
    "i432" => SpaceGroupEntry { number: 211, symbol: "I 4 3 2", hall: "I 4 2 3", default_setting: None },
    "p4332" => SpaceGroupEntry { number: 212, symbol: "P 43 3 2", hall: "P 4acd 2ab 3", default_setting: None },
    "p4132" => SpaceGroupEntry { number: 213, symbol: "P 41 3 2", hall: "P 4bd 2ab 3", default_setting: None },
    "i4132" => SpaceGroupEntry { number: 214, symbol: "I 41 3 2", hall: "I 4bd 2c 3", default_setting: None },
    "p-43m" => SpaceGroupEntry { number: 215, symbol: "P -4 3 m", hall: "P -4 2 3", default_setting: None },
    "f-43m" => SpaceGroupEntry { number: 216, symbol: "F -4 3 m", hall: "F -4 2 3", default_setting: None },
    "i-43m" => SpaceGroupEntry { number: 217, symbol: "I -4 3 m", hall: "I -4 2 3", default_setting: None },
    "p-43n" => SpaceGroupEntry { number: 218, symbol: "P -4 3 n", hall: "P -4n 2 3", default_setting: None },
    "f-43c" => SpaceGroupEntry { number: 219, symbol: "F -4 3 c", hall: "F -4c 2 3", default_setting: None },
    "i-43d" => SpaceGroupEntry { number: 220, symbol: "I -4 3 d", hall: "I -4bd 2c 3", default_setting: None },
    "pm-3m" => SpaceGroupEntry { number: 221, symbol: "P m -3 m", hall: "-P 4 2 3", default_setting: None },
    "pn-3n:1" => SpaceGroupEntry { number: 222, symbol: "P n -3 n", hall: "P 4 2 3 -1n", default_setting: Some("2") },
    "pn-3n" => SpaceGroupEntry { number: 222, symbol: "P n -3 n", hall: "-P 4a 2bc 3", default_setting: Some("2") },
    "pn-3n:2" => SpaceGroupEntry { number: 222, symbol: "P n -3 n", hall: "-P 4a 2bc 3", default_setting: Some("2") },
    "pm-3n" => SpaceGroupEntry { number: 223, symbol: "P m -3 n", hall: "-P 4n 2 3", default_setting: None },
    "pn-3m:1" => SpaceGroupEntry { number: 224, symbol: "P n -3 m", hall: "P 4n 2 3 -1n", default_setting: Some("2") },
    "pn-3m" => SpaceGroupEntry { number: 224, symbol: "P n -3 m", hall: "-P 4bc 2bc 3", default_setting: Some("2") },
    "pn-3m:2" => SpaceGroupEntry { number: 224, symbol: "P n -3 m", hall: "-P 4bc 2bc 3", default_setting: Some("2") },
    "fm-3m" => SpaceGroupEntry { number: 225, symbol: "F m -3 m", hall: "-F 4 2 3", default_setting: None },
    "fm-3c" => SpaceGroupEntry { number: 226, symbol: "F m -3 c", hall: "-F 4c 2 3", default_setting: None },
    "fd-3m:1" => SpaceGroupEntry { number: 227, symbol: "F d -3 m", hall: "F 4d 2 3 -1d", default_setting: Some("2") },
    "fd-3m" => SpaceGroupEntry { number: 227, symbol: "F d -3 m", hall: "-F 4vw 2vw 3", default_setting: Some("2") },
    "fd-3m:2" => SpaceGroupEntry { number: 227, symbol: "F d -3 m", hall: "-F 4vw 2vw 3", default_setting: Some("2") },
    "fd-3c:1" => SpaceGroupEntry { number: 228, symbol: "F d -3 c", hall: "F 4d 2 3 -1cd", default_setting: Some("2") },
    "fd-3c" => SpaceGroupEntry { number: 228, symbol: "F d -3 c", hall: "-F 4cvw 2vw 3", default_setting: Some("2") },
    "fd-3c:2" => SpaceGroupEntry { number: 228, symbol: "F d -3 c", hall: "-F 4cvw 2vw 3", default_setting: Some("2") },
    "im-3m" => SpaceGroupEntry { number: 229, symbol: "I m -3 m", hall: "-I 4 2 3", default_setting: None },
    "ia-3d" => SpaceGroupEntry { number: 230, symbol: "I a -3 d", hall: "-I 4bd 2c 3", default_setting: None },
};

/// Full, legacy or minus-free spellings mapped onto the keys of [`SPACE_GROUPS`].
pub static SYMBOL_ALIASES: Map<&'static str, &'static str> = phf_map! {
    "p121" => "p2",
    "p1211" => "p21",
    "c121" => "c2",
    "p1m1" => "pm",
    "p1c1" => "pc",
    "c1m1" => "cm",
    "c1c1" => "cc",
    "p12/m1" => "p2/m",
    "p121/m1" => "p21/m",
    "c12/m1" => "c2/m",
    "p12/c1" => "p2/c",
    "p121/c1" => "p21/c",
    "c12/c1" => "c2/c",
    "abm2" => "aem2",
    "aba2" => "aea2",
    "cmca" => "cmce",
    "cmma" => "cmme",
    "ccca" => "ccce",
    "pm3" => "pm-3",
    "pn3" => "pn-3",
    "fm3" => "fm-3",
    "fd3" => "fd-3",
    "im3" => "im-3",
    "pa3" => "pa-3",
    "ia3" => "ia-3",
    "p43m" => "p-43m",
    "f43m" => "f-43m",
    "i43m" => "i-43m",
    "p43n" => "p-43n",
    "f43c" => "f-43c",
    "i43d" => "i-43d",
    "pm3m" => "pm-3m",
    "pn3n" => "pn-3n",
    "pm3n" => "pm-3n",
    "pn3m" => "pn-3m",
    "fm3m" => "fm-3m",
    "fm3c" => "fm-3c",
    "fd3m" => "fd-3m",
    "fd3c" => "fd-3c",
    "im3m" => "im-3m",
    "ia3d" => "ia-3d",
    "p121/n1" => "p21/n",
    "p121/a1" => "p21/a",
    "i12/a1" => "i2/a",
    "p12/n1" => "p2/n",
    "p1n1" => "pn",
    "i1a1" => "ia",
    "i121" => "i2",
    "i12/m1" => "i2/m",
};

/// Lower-cases a Hermann–Mauguin symbol and strips whitespace and underscores.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves a symbol and optional coordinate-system code to a table entry.
///
/// A `:code` suffix on the symbol itself is honoured when no explicit code is given.
/// Groups with a single setting ignore the code.
pub fn lookup(
    symbol: &str,
    coord_code: Option<&str>,
) -> Result<&'static SpaceGroupEntry, SymmetryError> {
    let normalized = normalize_symbol(symbol);
    let (base, inline_code) = match normalized.split_once(':') {
        Some((base, code)) => (base.to_string(), Some(code.to_string())),
        None => (normalized, None),
    };
    let code = coord_code
        .map(normalize_symbol)
        .filter(|c| !c.is_empty())
        .or(inline_code.filter(|c| !c.is_empty()));

    let base = SYMBOL_ALIASES
        .get(base.as_str())
        .copied()
        .map(str::to_string)
        .unwrap_or(base);

    let entry = SPACE_GROUPS
        .get(base.as_str())
        .ok_or_else(|| SymmetryError::UnknownSpaceGroup(symbol.trim().to_string()))?;

    let Some(code) = code else {
        return Ok(entry);
    };
    if entry.default_setting.is_none() {
        return Ok(entry);
    }
    SPACE_GROUPS
        .get(format!("{base}:{code}").as_str())
        .ok_or_else(|| SymmetryError::UnknownSetting {
            symbol: symbol.trim().to_string(),
            code,
        })
}
