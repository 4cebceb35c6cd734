//! Compiled-in lookup tables.
//!
//! The bpm-to-increment table is generated at compile time from the exact
//! integer relation between the control rate and the 24 PPQN pulse grid.
//! The legacy timer curves and the LED breathing curve are fixed data
//! captured from the module's resource generator. All four are exposed as
//! pure data so tests can check their contracts directly.

/// Number of entries in [`TEMPO_PHASE_INCREMENT`]; one per bpm step.
pub const TEMPO_PHASE_INCREMENT_SIZE: usize = 512;

/// Phase-accumulator increment per primary tick, indexed by bpm.
///
/// At 24 PPQN the accumulator must wrap `bpm * 24 / 60` times per second,
/// which at the 8 kHz control rate works out to one full 2^32 sweep every
/// `120_000 / bpm` ticks. The table is monotone in bpm; entry 0 is zero
/// (a stopped clock) and is never selected by callers.
pub static TEMPO_PHASE_INCREMENT: [u32; TEMPO_PHASE_INCREMENT_SIZE] = tempo_phase_increments();

const fn tempo_phase_increments() -> [u32; TEMPO_PHASE_INCREMENT_SIZE] {
    let mut table = [0u32; TEMPO_PHASE_INCREMENT_SIZE];
    let mut bpm = 0;
    while bpm < TEMPO_PHASE_INCREMENT_SIZE {
        table[bpm] = (((bpm as u64) << 32) / 120_000) as u32;
        bpm += 1;
    }
    table
}

/// Number of entries in each legacy timer curve.
pub const LEGACY_TIMER_SIZE: usize = 256;

/// Legacy clock half-period in counter units, linear taper.
///
/// Counter units are 0.4 us at the fast secondary-tick rate; the curve spans
/// roughly 4 ms to 1.2 s per output edge, slowest at index 0 (pot fully
/// down). Both curves are monotone decreasing.
pub static LEGACY_TIMER_LIN: [u32; LEGACY_TIMER_SIZE] = [
    3062500, 3050530, 3038560, 3026591, 3014621, 3002651, 2990681, 2978711,
    2966742, 2954772, 2942802, 2930832, 2918862, 2906893, 2894923, 2882953,
    2870983, 2859013, 2847044, 2835074, 2823104, 2811134, 2799164, 2787195,
    2775225, 2763255, 2751285, 2739315, 2727345, 2715376, 2703406, 2691436,
    2679466, 2667496, 2655527, 2643557, 2631587, 2619617, 2607647, 2595678,
    2583708, 2571738, 2559768, 2547798, 2535829, 2523859, 2511889, 2499919,
    2487949, 2475980, 2464010, 2452040, 2440070, 2428100, 2416131, 2404161,
    2392191, 2380221, 2368251, 2356282, 2344312, 2332342, 2320372, 2308402,
    2296433, 2284463, 2272493, 2260523, 2248553, 2236584, 2224614, 2212644,
    2200674, 2188704, 2176735, 2164765, 2152795, 2140825, 2128855, 2116885,
    2104916, 2092946, 2080976, 2069006, 2057036, 2045067, 2033097, 2021127,
    2009157, 1997187, 1985218, 1973248, 1961278, 1949308, 1937338, 1925369,
    1913399, 1901429, 1889459, 1877489, 1865520, 1853550, 1841580, 1829610,
    1817640, 1805671, 1793701, 1781731, 1769761, 1757791, 1745822, 1733852,
    1721882, 1709912, 1697942, 1685973, 1674003, 1662033, 1650063, 1638093,
    1626124, 1614154, 1602184, 1590214, 1578244, 1566275, 1554305, 1542335,
    1530365, 1518395, 1506425, 1494456, 1482486, 1470516, 1458546, 1446576,
    1434607, 1422637, 1410667, 1398697, 1386727, 1374758, 1362788, 1350818,
    1338848, 1326878, 1314909, 1302939, 1290969, 1278999, 1267029, 1255060,
    1243090, 1231120, 1219150, 1207180, 1195211, 1183241, 1171271, 1159301,
    1147331, 1135362, 1123392, 1111422, 1099452, 1087482, 1075513, 1063543,
    1051573, 1039603, 1027633, 1015664, 1003694, 991724, 979754, 967784,
    955815, 943845, 931875, 919905, 907935, 895965, 883996, 872026,
    860056, 848086, 836116, 824147, 812177, 800207, 788237, 776267,
    764298, 752328, 740358, 728388, 716418, 704449, 692479, 680509,
    668539, 656569, 644600, 632630, 620660, 608690, 596720, 584751,
    572781, 560811, 548841, 536871, 524902, 512932, 500962, 488992,
    477022, 465053, 453083, 441113, 429143, 417173, 405204, 393234,
    381264, 369294, 357324, 345355, 333385, 321415, 309445, 297475,
    285505, 273536, 261566, 249596, 237626, 225656, 213687, 201717,
    189747, 177777, 165807, 153838, 141868, 129898, 117928, 105958,
    93989, 82019, 70049, 58079, 46109, 34140, 22170, 10200,
];

/// Legacy clock half-period in counter units, logarithmic taper.
///
/// Same endpoints as [`LEGACY_TIMER_LIN`] with a midpoint-0.9 parametric
/// log curve, giving finer control over the fast end of the range.
pub static LEGACY_TIMER_LOG: [u32; LEGACY_TIMER_SIZE] = [
    3062500, 3009698, 2957798, 2906785, 2856644, 2807359, 2758916, 2711301,
    2664500, 2618498, 2573282, 2528839, 2485154, 2442217, 2400013, 2358530,
    2317755, 2277678, 2238285, 2199565, 2161507, 2124099, 2087330, 2051189,
    2015666, 1980750, 1946430, 1912697, 1879540, 1846949, 1814916, 1783429,
    1752481, 1722062, 1692162, 1662773, 1633886, 1605492, 1577584, 1550153,
    1523190, 1496688, 1470639, 1445035, 1419868, 1395131, 1370817, 1346918,
    1323428, 1300339, 1277644, 1255338, 1233412, 1211861, 1190678, 1169857,
    1149392, 1129276, 1109504, 1090070, 1070968, 1052193, 1033738, 1015598,
    997769, 980244, 963018, 946087, 929445, 913087, 897009, 881206,
    865672, 850404, 835397, 820646, 806148, 791897, 777889, 764121,
    750588, 737286, 724212, 711361, 698729, 686313, 674110, 662115,
    650324, 638736, 627345, 616149, 605144, 594327, 583695, 573245,
    562973, 552877, 542953, 533199, 523611, 514188, 504925, 495820,
    486871, 478075, 469430, 460932, 452579, 444369, 436299, 428367,
    420570, 412907, 405375, 397971, 390694, 383541, 376511, 369600,
    362808, 356131, 349569, 343119, 336779, 330547, 324422, 318402,
    312484, 306667, 300950, 295331, 289807, 284378, 279042, 273797,
    268641, 263574, 258593, 253697, 248885, 244155, 239506, 234936,
    230444, 226030, 221690, 217425, 213232, 209112, 205061, 201080,
    197167, 193321, 189540, 185824, 182172, 178582, 175053, 171584,
    168175, 164824, 161530, 158293, 155111, 151983, 148909, 145887,
    142917, 139997, 137128, 134307, 131535, 128810, 126132, 123499,
    120912, 118368, 115868, 113411, 110996, 108622, 106288, 103994,
    101740, 99524, 97346, 95205, 93101, 91033, 89000, 87002,
    85038, 83107, 81210, 79344, 77511, 75709, 73938, 72197,
    70486, 68804, 67151, 65526, 63929, 62359, 60816, 59299,
    57809, 56343, 54903, 53488, 52096, 50728, 49384, 48063,
    46764, 45487, 44233, 42999, 41787, 40595, 39424, 38273,
    37141, 36029, 34936, 33862, 32805, 31767, 30747, 29744,
    28758, 27789, 26837, 25901, 24981, 24076, 23187, 22314,
    21455, 20611, 19781, 18965, 18164, 17376, 16601, 15840,
    15092, 14356, 13633, 12923, 12224, 11538, 10863, 10200,
];

/// Gaussian LED breathing curve for the menu's waiting state.
///
/// One period of a bell curve, peak brightness at index 0.
pub static GAUSS_CURVE: [u8; 500] = [
    255, 255, 255, 255, 255, 255, 255, 254, 254, 253, 253, 252, 252, 251, 250, 250, 249, 248, 247, 246,
    245, 244, 243, 242, 241, 240, 239, 237, 236, 235, 233, 232, 230, 229, 227, 226, 224, 222, 221, 219,
    217, 215, 213, 212, 210, 208, 206, 204, 202, 200, 198, 196, 194, 192, 190, 188, 186, 184, 181, 179,
    177, 175, 173, 171, 168, 166, 164, 162, 160, 157, 155, 153, 151, 149, 146, 144, 142, 140, 138, 135,
    133, 131, 129, 127, 125, 122, 120, 118, 116, 114, 112, 110, 108, 106, 104, 102, 100, 98, 96, 94,
    92, 91, 89, 87, 85, 83, 82, 80, 78, 76, 75, 73, 71, 70, 68, 67, 65, 64, 62, 61,
    59, 58, 56, 55, 54, 52, 51, 50, 48, 47, 46, 45, 44, 42, 41, 40, 39, 38, 37, 36,
    35, 34, 33, 32, 31, 30, 29, 29, 28, 27, 26, 25, 25, 24, 23, 22, 22, 21, 20, 20,
    19, 19, 18, 17, 17, 16, 16, 15, 15, 14, 14, 13, 13, 13, 12, 12, 11, 11, 11, 10,
    10, 10, 9, 9, 9, 8, 8, 8, 7, 7, 7, 7, 6, 6, 6, 6, 6, 5, 5, 5,
    5, 5, 4, 4, 4, 4, 4, 4, 4, 3, 3, 3, 3, 3, 3, 3, 3, 3, 2, 2,
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
];

// ── Unit Tests ────────────────────────────────────────────────────────────────
