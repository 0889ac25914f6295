//! Gauss-Kronrod rule tables.
//!
//! Each rule stores only the non-negative half of the symmetric abscissas,
//! ordered from the centre outwards. A point `ξ_i` contributes
//! `w_i * (f(x+) + f(x-))` where `x± = mid ± jacobian * ξ_i`; the centre weight
//! is therefore stored halved, so the centre point (where `x+ == x-`) needs no
//! special treatment in the weighting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order of a Gauss-Kronrod rule, named by its number of Kronrod points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RuleOrder {
    /// 7-point Gauss embedded in a 15-point Kronrod rule.
    #[default]
    K15,
    /// 10-point Gauss embedded in a 21-point Kronrod rule.
    K21,
    /// 15-point Gauss embedded in a 31-point Kronrod rule.
    K31,
}

impl RuleOrder {
    /// Number of Kronrod points (`NRULE`).
    pub fn kronrod_points(&self) -> usize {
        match self {
            Self::K15 => 15,
            Self::K21 => 21,
            Self::K31 => 31,
        }
    }

    /// Number of embedded Gauss points.
    pub fn gauss_points(&self) -> usize {
        (self.kronrod_points() - 1) / 2
    }

    /// Highest polynomial degree integrated exactly by the embedded Gauss rule.
    pub fn gauss_exact_degree(&self) -> usize {
        2 * self.gauss_points() - 1
    }
}

// Abscissas (centre first) and weights, QUADPACK qk15/qk21/qk31.
const K15_X: [f64; 8] = [
    0.0,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.586_087_235_467_691_130_294_144_838_258_730,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.991_455_371_120_812_639_206_854_697_526_329,
];
const K15_WK: [f64; 8] = [
    0.209_482_141_084_727_828_012_999_174_891_714,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.022_935_322_010_529_224_963_732_008_058_970,
];
const K15_WG: [f64; 8] = [
    0.417_959_183_673_469_387_755_102_040_816_327,
    0.0,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.0,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.0,
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.0,
];

const K21_X: [f64; 11] = [
    0.0,
    0.148_874_338_981_631_210_884_826_001_129_720,
    0.294_392_862_701_460_198_131_126_603_103_866,
    0.433_395_394_129_247_190_799_265_943_165_784,
    0.562_757_134_668_604_683_339_000_099_272_694,
    0.679_409_568_299_024_406_234_327_365_114_874,
    0.780_817_726_586_416_897_063_717_578_345_042,
    0.865_063_366_688_984_510_732_096_688_423_493,
    0.930_157_491_355_708_226_001_207_180_059_508,
    0.973_906_528_517_171_720_077_964_012_084_452,
    0.995_657_163_025_808_080_735_527_280_689_003,
];
const K21_WK: [f64; 11] = [
    0.149_445_554_002_916_905_664_936_468_389_821,
    0.147_739_104_901_338_491_374_841_515_972_068,
    0.142_775_938_577_060_080_797_094_273_138_717,
    0.134_709_217_311_473_325_928_054_001_771_707,
    0.123_491_976_262_065_851_077_208_015_134_365,
    0.109_387_158_802_297_641_899_210_590_325_805,
    0.093_125_454_583_697_605_535_065_465_083_366,
    0.075_039_674_810_919_952_767_043_140_916_190,
    0.054_755_896_574_351_996_031_381_300_244_580,
    0.032_558_162_307_964_727_478_818_972_459_390,
    0.011_694_638_867_371_874_278_064_396_062_192,
];
const K21_WG: [f64; 11] = [
    0.0,
    0.295_524_224_714_752_870_173_892_994_651_338,
    0.0,
    0.269_266_719_309_996_355_091_226_921_569_469,
    0.0,
    0.219_086_362_515_982_043_995_534_934_228_163,
    0.0,
    0.149_451_349_150_580_593_145_776_339_657_697,
    0.0,
    0.066_671_344_308_688_137_593_568_809_893_332,
    0.0,
];

const K31_X: [f64; 16] = [
    0.0,
    0.101_142_066_918_717_499_027_074_231_447_392,
    0.201_194_093_997_434_522_300_628_303_394_596,
    0.299_180_007_153_168_812_166_780_024_266_389,
    0.394_151_347_077_563_369_897_207_370_981_045,
    0.485_081_863_640_239_680_693_655_740_232_351,
    0.570_972_172_608_538_847_537_226_737_253_911,
    0.650_996_741_297_416_970_533_735_895_313_275,
    0.724_417_731_360_170_047_416_186_054_613_938,
    0.790_418_501_442_465_932_967_649_294_817_947,
    0.848_206_583_410_427_216_200_648_320_774_217,
    0.897_264_532_344_081_900_882_509_656_454_496,
    0.937_273_392_400_705_904_307_758_947_710_209,
    0.967_739_075_679_139_134_257_347_978_784_337,
    0.987_992_518_020_485_428_489_565_718_586_613,
    0.998_002_298_693_397_060_285_172_840_152_271,
];
const K31_WK: [f64; 16] = [
    0.101_330_389_185_927_371_339_204_261_356_068,
    0.100_769_845_523_875_595_044_946_662_617_570,
    0.099_173_598_721_791_959_332_393_173_484_603,
    0.096_540_088_514_727_800_566_764_830_063_574,
    0.092_890_152_315_699_803_921_039_684_004_823,
    0.088_249_690_258_459_978_979_223_423_552_586,
    0.082_657_391_562_164_879_555_039_267_349_939,
    0.076_161_532_664_740_203_930_229_506_729_174,
    0.068_815_689_566_097_685_801_562_319_058_107,
    0.060_681_096_056_449_666_668_363_461_936_895,
    0.051_821_051_653_556_811_146_729_268_673_829,
    0.042_308_890_507_798_671_072_498_148_909_301,
    0.032_217_097_551_918_635_038_351_508_860_247,
    0.021_630_274_268_698_722_668_151_940_168_321,
    0.010_612_064_029_110_718_618_802_830_511_873,
    0.003_073_583_718_520_531_501_218_293_246_031,
];
const K31_WG: [f64; 16] = [
    0.202_578_241_925_561_272_880_620_199_967_519,
    0.0,
    0.198_431_485_327_111_576_456_118_326_443_839,
    0.0,
    0.186_161_000_015_562_211_026_800_561_866_423,
    0.0,
    0.166_269_205_816_993_933_553_200_860_481_209,
    0.0,
    0.139_570_677_926_154_314_447_804_794_511_028,
    0.0,
    0.107_159_220_467_171_935_011_869_546_685_869,
    0.0,
    0.070_366_047_488_108_124_709_267_416_450_667,
    0.0,
    0.030_753_241_996_117_268_354_628_393_577_204,
    0.0,
];

/// An embedded Gauss-Kronrod rule on the canonical interval `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussKronrodRule {
    order: RuleOrder,
    abscissas: Vec<f64>,
    kronrod_weights: Vec<f64>,
    gauss_weights: Vec<f64>,
}

impl GaussKronrodRule {
    /// Build the rule table for `order`.
    pub fn new(order: RuleOrder) -> Self {
        let (x, wk, wg): (&[f64], &[f64], &[f64]) = match order {
            RuleOrder::K15 => (&K15_X, &K15_WK, &K15_WG),
            RuleOrder::K21 => (&K21_X, &K21_WK, &K21_WG),
            RuleOrder::K31 => (&K31_X, &K31_WK, &K31_WG),
        };

        let mut kronrod_weights = wk.to_vec();
        let mut gauss_weights = wg.to_vec();
        // x+ and x- coincide at the centre
        kronrod_weights[0] *= 0.5;
        gauss_weights[0] *= 0.5;

        Self {
            order,
            abscissas: x.to_vec(),
            kronrod_weights,
            gauss_weights,
        }
    }

    pub fn order(&self) -> RuleOrder {
        self.order
    }

    /// Number of evaluation points per node, `⌈(NRULE + 1) / 2⌉`.
    pub fn n_points(&self) -> usize {
        self.abscissas.len()
    }

    /// Canonical abscissa of point `i` on `[0, 1]`.
    pub fn canonical_abscissa(&self, i: usize) -> f64 {
        self.abscissas[i]
    }

    pub fn kronrod_weight(&self, i: usize) -> f64 {
        self.kronrod_weights[i]
    }

    /// Gauss weight of point `i`; zero for Kronrod-only points.
    pub fn gauss_weight(&self, i: usize) -> f64 {
        self.gauss_weights[i]
    }

    /// Map point `i` onto `[lower, upper]`.
    ///
    /// Returns `(x_plus, x_minus, jacobian)` where `x±` are symmetric about the
    /// midpoint and `jacobian = (upper - lower) / 2`.
    #[inline]
    pub fn abscissa(&self, i: usize, lower: f64, upper: f64) -> (f64, f64, f64) {
        let jacobian = 0.5 * (upper - lower);
        let mid = 0.5 * (upper + lower);
        let offset = jacobian * self.abscissas[i];
        ((mid + offset).min(upper), (mid - offset).max(lower), jacobian)
    }

    /// Apply the rule once over `[lower, upper]`.
    ///
    /// Returns `(kronrod, gauss)` estimates of the integral.
    pub fn single<F>(&self, f: F, lower: f64, upper: f64) -> (f64, f64)
    where
        F: Fn(f64) -> f64,
    {
        let mut kronrod = 0.0;
        let mut gauss = 0.0;
        for i in 0..self.n_points() {
            let (xp, xm, jacobian) = self.abscissa(i, lower, upper);
            let fsum = if i == 0 { 2.0 * f(xp) } else { f(xp) + f(xm) };
            kronrod += jacobian * self.kronrod_weights[i] * fsum;
            gauss += jacobian * self.gauss_weights[i] * fsum;
        }
        (kronrod, gauss)
    }
}

impl Default for GaussKronrodRule {
    fn default() -> Self {
        Self::new(RuleOrder::default())
    }
}

impl fmt::Display for GaussKronrodRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Gauss-Kronrod rule G{}-K{} ({} points per node)",
            self.order.gauss_points(),
            self.order.kronrod_points(),
            self.n_points()
        )?;
        for i in 0..self.n_points() {
            writeln!(
                f,
                "  x[{:2}] = {:.18}  w_k = {:.18}  w_g = {:.18}",
                i, self.abscissas[i], self.kronrod_weights[i], self.gauss_weights[i]
            )?;
        }
        Ok(())
    }
}
