//! Scattering data for the reference engines.
//!
//! Neutron coherent scattering lengths are given in fm (Sears, Neutron News 3, 1992).
//! X-ray form factors use the four-Gaussian Cromer–Mann parameterisation of
//! International Tables Vol. C, Table 6.1.1.4:
//! `f(s) = Σᵢ aᵢ exp(-bᵢ s²) + c` with `s = sin θ / λ`.

use super::EngineFault;
use crate::core::experiment::Radiation;
use crate::core::models::atom::element_symbol;
use phf::{Map, phf_map};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CromerMann {
    pub a: [f64; 4],
    pub b: [f64; 4],
    pub c: f64,
}

impl CromerMann {
    pub fn evaluate(&self, stl: f64) -> f64 {
        let s2 = stl * stl;
        self.a
            .iter()
            .zip(&self.b)
            .fold(self.c, |f, (a, b)| f + a * (-b * s2).exp())
    }
}

pub static NEUTRON_LENGTHS: Map<&'static str, f64> = phf_map! {
    // --- Light elements ---
    "H" => -3.739, "D" => 6.671, "He" => 3.26, "Li" => -1.90, "Be" => 7.79,
    "B" => 5.30, "C" => 6.646, "N" => 9.36, "O" => 5.803, "F" => 5.654,
    "Ne" => 4.566, "Na" => 3.63, "Mg" => 5.375, "Al" => 3.449, "Si" => 4.1491,
    "P" => 5.13, "S" => 2.847, "Cl" => 9.577, "Ar" => 1.909, "K" => 3.67,
    "Ca" => 4.70,
    // --- Transition metals ---
    "Sc" => 12.29, "Ti" => -3.438, "V" => -0.3824, "Cr" => 3.635, "Mn" => -3.73,
    "Fe" => 9.45, "Co" => 2.49, "Ni" => 10.3, "Cu" => 7.718, "Zn" => 5.680,
    "Y" => 7.75, "Zr" => 7.16, "Nb" => 7.054, "Mo" => 6.715, "Ag" => 5.922,
    "Cd" => 4.87, "W" => 4.86, "Pt" => 9.60, "Au" => 7.63, "Hg" => 12.692,
    // --- Main group, heavy ---
    "Ga" => 7.288, "Ge" => 8.185, "As" => 6.58, "Se" => 7.970, "Br" => 6.795,
    "Kr" => 7.81, "Rb" => 7.09, "Sr" => 7.02, "In" => 4.065, "Sn" => 6.225,
    "Sb" => 5.57, "Te" => 5.80, "I" => 5.28, "Cs" => 5.42, "Ba" => 5.07,
    "Pb" => 9.405, "Bi" => 8.532,
    // --- Lanthanides, actinides ---
    "La" => 8.24, "Ce" => 4.84, "Nd" => 7.69, "Gd" => 6.5, "U" => 8.417,
};

pub static XRAY_FORM_FACTORS: Map<&'static str, CromerMann> = phf_map! {
    "H" => CromerMann {
        a: [0.493002, 0.322912, 0.140191, 0.040810],
        b: [10.5109, 26.1257, 3.14236, 57.7997],
        c: 0.003038,
    },
    "D" => CromerMann {
        a: [0.493002, 0.322912, 0.140191, 0.040810],
        b: [10.5109, 26.1257, 3.14236, 57.7997],
        c: 0.003038,
    },
    "He" => CromerMann {
        a: [0.8734, 0.6309, 0.3112, 0.1780],
        b: [9.1037, 3.3568, 22.9276, 0.9821],
        c: 0.0064,
    },
    "Li" => CromerMann {
        a: [1.1282, 0.7508, 0.6175, 0.4653],
        b: [3.9546, 1.0524, 85.3905, 168.261],
        c: 0.0377,
    },
    "Be" => CromerMann {
        a: [1.5919, 1.1278, 0.5391, 0.7029],
        b: [43.6427, 1.8623, 103.483, 0.5420],
        c: 0.0385,
    },
    "B" => CromerMann {
        a: [2.0545, 1.3326, 1.0979, 0.7068],
        b: [23.2185, 1.0210, 60.3498, 0.1403],
        c: -0.1932,
    },
    "C" => CromerMann {
        a: [2.3100, 1.0200, 1.5886, 0.8650],
        b: [20.8439, 10.2075, 0.5687, 51.6512],
        c: 0.2156,
    },
    "N" => CromerMann {
        a: [12.2126, 3.1322, 2.0125, 1.1663],
        b: [0.0057, 9.8933, 28.9975, 0.5826],
        c: -11.529,
    },
    "O" => CromerMann {
        a: [3.0485, 2.2868, 1.5463, 0.8670],
        b: [13.2771, 5.7011, 0.3239, 32.9089],
        c: 0.2508,
    },
    "F" => CromerMann {
        a: [3.5392, 2.6412, 1.5170, 1.0243],
        b: [10.2825, 4.2944, 0.2615, 26.1476],
        c: 0.2776,
    },
    "Na" => CromerMann {
        a: [4.7626, 3.1736, 1.2674, 1.1128],
        b: [3.2850, 8.8422, 0.3136, 129.424],
        c: 0.6760,
    },
    "Mg" => CromerMann {
        a: [5.4204, 2.1735, 1.2269, 2.3073],
        b: [2.8275, 79.2611, 0.3808, 7.1937],
        c: 0.8584,
    },
    "Al" => CromerMann {
        a: [6.4202, 1.9002, 1.5936, 1.9646],
        b: [3.0387, 0.7426, 31.5472, 85.0886],
        c: 1.1151,
    },
    "Si" => CromerMann {
        a: [6.2915, 3.0353, 1.9891, 1.5410],
        b: [2.4386, 32.3337, 0.6785, 81.6937],
        c: 1.1407,
    },
    "P" => CromerMann {
        a: [6.4345, 4.1791, 1.7800, 1.4908],
        b: [1.9067, 27.1570, 0.5260, 68.1645],
        c: 1.1149,
    },
    "S" => CromerMann {
        a: [6.9053, 5.2034, 1.4379, 1.5863],
        b: [1.4679, 22.2151, 0.2536, 56.1720],
        c: 0.8669,
    },
    "Cl" => CromerMann {
        a: [11.4604, 7.1964, 6.2556, 1.6455],
        b: [0.0104, 1.1662, 18.5194, 47.7784],
        c: -9.5574,
    },
    "K" => CromerMann {
        a: [8.2186, 7.4398, 1.0519, 0.8659],
        b: [12.7949, 0.7748, 213.187, 41.6841],
        c: 1.4228,
    },
    "Ca" => CromerMann {
        a: [8.6266, 7.3873, 1.5899, 1.0211],
        b: [10.4421, 0.6599, 85.7484, 178.437],
        c: 1.3751,
    },
    "Ti" => CromerMann {
        a: [9.7595, 7.3558, 1.6991, 1.9021],
        b: [7.8508, 0.5000, 35.6338, 116.105],
        c: 1.2807,
    },
    "V" => CromerMann {
        a: [10.2971, 7.3511, 2.0703, 2.0571],
        b: [6.8657, 0.4385, 26.8938, 102.478],
        c: 1.2199,
    },
    "Cr" => CromerMann {
        a: [10.6406, 7.3537, 3.3240, 1.4922],
        b: [6.1038, 0.3920, 20.2626, 98.7399],
        c: 1.1832,
    },
    "Mn" => CromerMann {
        a: [11.2819, 7.3573, 3.0193, 2.2441],
        b: [5.3409, 0.3432, 17.8674, 83.7543],
        c: 1.0896,
    },
    "Fe" => CromerMann {
        a: [11.7695, 7.3573, 3.5222, 2.3045],
        b: [4.7611, 0.3072, 15.3535, 76.8805],
        c: 1.0369,
    },
    "Co" => CromerMann {
        a: [12.2841, 7.3409, 4.0034, 2.3488],
        b: [4.2791, 0.2784, 13.5359, 71.1692],
        c: 1.0118,
    },
    "Ni" => CromerMann {
        a: [12.8376, 7.2920, 4.4438, 2.3800],
        b: [3.8785, 0.2565, 12.1763, 66.3421],
        c: 1.0341,
    },
    "Cu" => CromerMann {
        a: [13.3380, 7.1676, 5.6158, 1.6735],
        b: [3.5828, 0.2470, 11.3966, 64.8126],
        c: 1.1910,
    },
    "Zn" => CromerMann {
        a: [14.0743, 7.0318, 5.1652, 2.4100],
        b: [3.2655, 0.2333, 10.3163, 58.7097],
        c: 1.3041,
    },
    "Ga" => CromerMann {
        a: [15.2354, 6.7006, 4.3591, 2.9623],
        b: [3.0669, 0.2412, 10.7805, 61.4135],
        c: 1.7189,
    },
    "Ge" => CromerMann {
        a: [16.0816, 6.3747, 3.7068, 3.6830],
        b: [2.8509, 0.2516, 11.4468, 54.7625],
        c: 2.1313,
    },
    "As" => CromerMann {
        a: [16.6723, 6.0701, 3.4313, 4.2779],
        b: [2.6345, 0.2647, 12.9479, 47.7972],
        c: 2.531,
    },
    "Se" => CromerMann {
        a: [17.0006, 5.8196, 3.9731, 4.3543],
        b: [2.4098, 0.2726, 15.2372, 43.8163],
        c: 2.8409,
    },
    "Br" => CromerMann {
        a: [17.1789, 5.2358, 5.6377, 3.9851],
        b: [2.1723, 16.5796, 0.2609, 41.4328],
        c: 2.9557,
    },
    "Rb" => CromerMann {
        a: [17.5816, 7.6598, 5.8981, 2.7817],
        b: [1.7139, 14.7957, 0.1603, 31.2087],
        c: 2.0782,
    },
    "Sr" => CromerMann {
        a: [17.5663, 9.8184, 5.4220, 2.6694],
        b: [1.5564, 14.0988, 0.1664, 132.376],
        c: 2.5064,
    },
    "Y" => CromerMann {
        a: [17.7760, 10.2946, 5.7263, 3.2656],
        b: [1.4029, 12.8006, 0.1255, 104.354],
        c: 1.9341,
    },
    "Zr" => CromerMann {
        a: [17.8765, 10.9480, 5.4173, 3.6577],
        b: [1.2761, 11.9160, 0.1176, 87.6627],
        c: 2.0690,
    },
    "Nb" => CromerMann {
        a: [17.6142, 12.0144, 4.0418, 3.5334],
        b: [1.1886, 11.7660, 0.2047, 69.7957],
        c: 3.7553,
    },
    "Mo" => CromerMann {
        a: [3.7025, 17.2356, 12.8876, 3.7429],
        b: [0.2772, 1.0958, 11.0040, 61.6584],
        c: 4.3875,
    },
    "Ag" => CromerMann {
        a: [19.2808, 16.6885, 4.8045, 1.0463],
        b: [0.6446, 7.4726, 24.6605, 99.8156],
        c: 5.1790,
    },
    "Ba" => CromerMann {
        a: [20.3361, 19.2970, 10.8880, 2.6959],
        b: [3.2160, 0.2756, 20.2073, 167.202],
        c: 2.7731,
    },
    "La" => CromerMann {
        a: [20.5780, 19.5990, 11.3727, 3.2879],
        b: [2.9480, 0.2440, 18.7726, 133.124],
        c: 2.1461,
    },
    "Ce" => CromerMann {
        a: [21.1671, 19.7695, 11.8513, 3.3303],
        b: [2.8129, 0.2268, 17.6083, 127.113],
        c: 1.8623,
    },
    "Au" => CromerMann {
        a: [16.8819, 18.5913, 25.5582, 5.8600],
        b: [0.4611, 8.6216, 1.4826, 36.3956],
        c: 12.0658,
    },
    "Pb" => CromerMann {
        a: [31.0617, 13.0637, 18.4420, 5.9696],
        b: [0.6902, 2.3576, 8.6180, 47.2579],
        c: 13.4118,
    },
    "Bi" => CromerMann {
        a: [33.3689, 12.9510, 16.5877, 6.4692],
        b: [0.7040, 2.9238, 8.7937, 48.0093],
        c: 13.5782,
    },
};

/// Scattering amplitude of `type_symbol` at `stl = sin θ / λ`: the coherent length in fm
/// for neutrons, the form factor in electrons for x-rays.
pub fn amplitude(type_symbol: &str, stl: f64, radiation: Radiation) -> Result<f64, EngineFault> {
    let element = element_symbol(type_symbol);
    let found = match radiation {
        Radiation::Neutron => NEUTRON_LENGTHS.get(element.as_str()).copied(),
        Radiation::XRay => XRAY_FORM_FACTORS
            .get(element.as_str())
            .map(|cm| cm.evaluate(stl)),
    };
    found.ok_or(EngineFault::UnknownScatterer(element))
}
