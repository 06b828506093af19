//! Seeded simplex noise (Gustavson) in 1 to 4 dimensions plus fractal composites.
//!
//! The permutation table is built once per seed; sampling is pure and never allocates.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

const F2: f32 = 0.366_025_42; // (sqrt(3) - 1) / 2
const G2: f32 = 0.211_324_87; // (3 - sqrt(3)) / 6
const F3: f32 = 1.0 / 3.0;
const G3: f32 = 1.0 / 6.0;
const F4: f32 = 0.309_017; // (sqrt(5) - 1) / 4
const G4: f32 = 0.138_196_6; // (5 - sqrt(5)) / 20

const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

const GRAD4: [[f32; 4]; 32] = [
    [0.0, 1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0, -1.0],
    [0.0, 1.0, -1.0, 1.0],
    [0.0, 1.0, -1.0, -1.0],
    [0.0, -1.0, 1.0, 1.0],
    [0.0, -1.0, 1.0, -1.0],
    [0.0, -1.0, -1.0, 1.0],
    [0.0, -1.0, -1.0, -1.0],
    [1.0, 0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, -1.0],
    [1.0, 0.0, -1.0, 1.0],
    [1.0, 0.0, -1.0, -1.0],
    [-1.0, 0.0, 1.0, 1.0],
    [-1.0, 0.0, 1.0, -1.0],
    [-1.0, 0.0, -1.0, 1.0],
    [-1.0, 0.0, -1.0, -1.0],
    [1.0, 1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, -1.0],
    [1.0, -1.0, 0.0, 1.0],
    [1.0, -1.0, 0.0, -1.0],
    [-1.0, 1.0, 0.0, 1.0],
    [-1.0, 1.0, 0.0, -1.0],
    [-1.0, -1.0, 0.0, 1.0],
    [-1.0, -1.0, 0.0, -1.0],
    [1.0, 1.0, 1.0, 0.0],
    [1.0, 1.0, -1.0, 0.0],
    [1.0, -1.0, 1.0, 0.0],
    [1.0, -1.0, -1.0, 0.0],
    [-1.0, 1.0, 1.0, 0.0],
    [-1.0, 1.0, -1.0, 0.0],
    [-1.0, -1.0, 1.0, 0.0],
    [-1.0, -1.0, -1.0, 0.0],
];

type Offset3 = (usize, usize, usize);

/// Fractal settings shared by [`NoiseGenerator::fbm2`] and friends.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Octaves {
    /// Number of layers summed. Zero is treated as one.
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude multiplier per octave.
    pub gain: f32,
}

impl Default for Octaves {
    fn default() -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            gain: 0.5,
        }
    }
}

impl Octaves {
    pub fn new(octaves: u32) -> Self {
        Self {
            octaves,
            ..Self::default()
        }
    }

    /// Sum `sample(frequency)` weighted per octave, divided by the total amplitude.
    fn accumulate(&self, mut sample: impl FnMut(f32) -> f32) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;
        for _ in 0..self.octaves.max(1) {
            total += sample(frequency) * amplitude;
            max_value += amplitude;
            amplitude *= self.gain;
            frequency *= self.lacunarity;
        }
        if max_value > 0.0 {
            total / max_value
        } else {
            0.0
        }
    }
}

/// Simplex noise with a permutation table derived from a 32-bit seed.
#[derive(Clone)]
pub struct NoiseGenerator {
    perm: [u8; 512],
    seed: u32,
}

impl std::fmt::Debug for NoiseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseGenerator")
            .field("seed", &self.seed)
            .finish()
    }
}

impl NoiseGenerator {
    pub fn new(seed: u32) -> Self {
        // PCG32 takes a 64-bit state; duplicate the seed into both halves.
        let seed64 = (seed as u64) | ((seed as u64) << 32);
        let mut rng = Pcg32::seed_from_u64(seed64);

        let mut source: [u8; 256] = [0; 256];
        for (i, slot) in source.iter_mut().enumerate() {
            *slot = i as u8;
        }
        // Fisher-Yates
        for i in (1..256).rev() {
            let j = rng.gen_range(0..=i);
            source.swap(i, j);
        }

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&source);
        perm[256..].copy_from_slice(&source);
        Self { perm, seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    fn p(&self, index: usize) -> usize {
        self.perm[index] as usize
    }

    /// One-dimensional noise: a slice of [`noise2`](Self::noise2) at `y = 0`.
    #[inline]
    pub fn noise1(&self, x: f32) -> f32 {
        self.noise2(x, 0.0)
    }

    pub fn noise2(&self, x: f32, y: f32) -> f32 {
        let s = (x + y) * F2;
        let i = (x + s).floor() as i32;
        let j = (y + s).floor() as i32;
        let t = (i as f32 + j as f32) * G2;
        let x0 = x - (i as f32 - t);
        let y0 = y - (j as f32 - t);

        let (i1, j1): (usize, usize) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f32 + G2;
        let y1 = y0 - j1 as f32 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let gi0 = self.p(ii + self.p(jj)) % 12;
        let gi1 = self.p(ii + i1 + self.p(jj + j1)) % 12;
        let gi2 = self.p(ii + 1 + self.p(jj + 1)) % 12;

        let corner = |gi: usize, x: f32, y: f32| {
            let t = 0.5 - x * x - y * y;
            if t < 0.0 {
                0.0
            } else {
                let g = GRAD3[gi];
                let t2 = t * t;
                t2 * t2 * (g[0] * x + g[1] * y)
            }
        };

        70.0 * (corner(gi0, x0, y0) + corner(gi1, x1, y1) + corner(gi2, x2, y2))
    }

    pub fn noise3(&self, x: f32, y: f32, z: f32) -> f32 {
        let s = (x + y + z) * F3;
        let i = (x + s).floor() as i32;
        let j = (y + s).floor() as i32;
        let k = (z + s).floor() as i32;
        let t = (i as f32 + j as f32 + k as f32) * G3;
        let x0 = x - (i as f32 - t);
        let y0 = y - (j as f32 - t);
        let z0 = z - (k as f32 - t);

        // Which of the six tetrahedra we are in.
        let ((i1, j1, k1), (i2, j2, k2)): (Offset3, Offset3) = if x0 >= y0 {
            if y0 >= z0 {
                ((1, 0, 0), (1, 1, 0))
            } else if x0 >= z0 {
                ((1, 0, 0), (1, 0, 1))
            } else {
                ((0, 0, 1), (1, 0, 1))
            }
        } else if y0 < z0 {
            ((0, 0, 1), (0, 1, 1))
        } else if x0 < z0 {
            ((0, 1, 0), (0, 1, 1))
        } else {
            ((0, 1, 0), (1, 1, 0))
        };

        let x1 = x0 - i1 as f32 + G3;
        let y1 = y0 - j1 as f32 + G3;
        let z1 = z0 - k1 as f32 + G3;
        let x2 = x0 - i2 as f32 + 2.0 * G3;
        let y2 = y0 - j2 as f32 + 2.0 * G3;
        let z2 = z0 - k2 as f32 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;
        let gi0 = self.p(ii + self.p(jj + self.p(kk))) % 12;
        let gi1 = self.p(ii + i1 + self.p(jj + j1 + self.p(kk + k1))) % 12;
        let gi2 = self.p(ii + i2 + self.p(jj + j2 + self.p(kk + k2))) % 12;
        let gi3 = self.p(ii + 1 + self.p(jj + 1 + self.p(kk + 1))) % 12;

        let corner = |gi: usize, x: f32, y: f32, z: f32| {
            let t = 0.6 - x * x - y * y - z * z;
            if t < 0.0 {
                0.0
            } else {
                let g = GRAD3[gi];
                let t2 = t * t;
                t2 * t2 * (g[0] * x + g[1] * y + g[2] * z)
            }
        };

        32.0 * (corner(gi0, x0, y0, z0)
            + corner(gi1, x1, y1, z1)
            + corner(gi2, x2, y2, z2)
            + corner(gi3, x3, y3, z3))
    }

    pub fn noise4(&self, x: f32, y: f32, z: f32, w: f32) -> f32 {
        let s = (x + y + z + w) * F4;
        let i = (x + s).floor() as i32;
        let j = (y + s).floor() as i32;
        let k = (z + s).floor() as i32;
        let l = (w + s).floor() as i32;
        let t = (i as f32 + j as f32 + k as f32 + l as f32) * G4;
        let x0 = x - (i as f32 - t);
        let y0 = y - (j as f32 - t);
        let z0 = z - (k as f32 - t);
        let w0 = w - (l as f32 - t);

        // Rank each coordinate by magnitude to pick the simplex traversal order.
        let mut rank = [0usize; 4];
        let c = [x0, y0, z0, w0];
        for a in 0..4 {
            for b in (a + 1)..4 {
                if c[a] > c[b] {
                    rank[a] += 1;
                } else {
                    rank[b] += 1;
                }
            }
        }
        let step = |threshold: usize| -> [usize; 4] {
            [
                (rank[0] >= threshold) as usize,
                (rank[1] >= threshold) as usize,
                (rank[2] >= threshold) as usize,
                (rank[3] >= threshold) as usize,
            ]
        };
        let o1 = step(3);
        let o2 = step(2);
        let o3 = step(1);

        let offset = |o: [usize; 4], n: f32| -> [f32; 4] {
            [
                x0 - o[0] as f32 + n * G4,
                y0 - o[1] as f32 + n * G4,
                z0 - o[2] as f32 + n * G4,
                w0 - o[3] as f32 + n * G4,
            ]
        };
        let p0 = [x0, y0, z0, w0];
        let p1 = offset(o1, 1.0);
        let p2 = offset(o2, 2.0);
        let p3 = offset(o3, 3.0);
        let p4 = offset([1, 1, 1, 1], 4.0);

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;
        let ll = (l & 255) as usize;
        let hash = |o: [usize; 4]| -> usize {
            self.p(ii + o[0] + self.p(jj + o[1] + self.p(kk + o[2] + self.p(ll + o[3])))) % 32
        };

        let corner = |gi: usize, p: [f32; 4]| {
            let t = 0.6 - p[0] * p[0] - p[1] * p[1] - p[2] * p[2] - p[3] * p[3];
            if t < 0.0 {
                0.0
            } else {
                let g = GRAD4[gi];
                let t2 = t * t;
                t2 * t2 * (g[0] * p[0] + g[1] * p[1] + g[2] * p[2] + g[3] * p[3])
            }
        };

        27.0 * (corner(hash([0, 0, 0, 0]), p0)
            + corner(hash(o1), p1)
            + corner(hash(o2), p2)
            + corner(hash(o3), p3)
            + corner(hash([1, 1, 1, 1]), p4))
    }

    /// Fractal Brownian motion in 2D, roughly `[-1, 1]`.
    pub fn fbm2(&self, x: f32, y: f32, octaves: &Octaves) -> f32 {
        octaves.accumulate(|f| self.noise2(x * f, y * f))
    }

    /// Fractal Brownian motion in 3D, roughly `[-1, 1]`.
    pub fn fbm3(&self, x: f32, y: f32, z: f32, octaves: &Octaves) -> f32 {
        octaves.accumulate(|f| self.noise3(x * f, y * f, z * f))
    }

    /// Ridged multifractal in 2D, remapped to `[-1, 1]`.
    pub fn ridged2(&self, x: f32, y: f32, octaves: &Octaves) -> f32 {
        2.0 * octaves.accumulate(|f| ridge(self.noise2(x * f, y * f))) - 1.0
    }

    /// Ridged multifractal in 3D, remapped to `[-1, 1]`.
    pub fn ridged3(&self, x: f32, y: f32, z: f32, octaves: &Octaves) -> f32 {
        2.0 * octaves.accumulate(|f| ridge(self.noise3(x * f, y * f, z * f))) - 1.0
    }

    /// Sum of absolute octaves in 2D, in `[0, 1]`.
    pub fn turbulence2(&self, x: f32, y: f32, octaves: &Octaves) -> f32 {
        octaves.accumulate(|f| self.noise2(x * f, y * f).abs().min(1.0))
    }

    /// Sum of absolute octaves in 3D, in `[0, 1]`.
    pub fn turbulence3(&self, x: f32, y: f32, z: f32, octaves: &Octaves) -> f32 {
        octaves.accumulate(|f| self.noise3(x * f, y * f, z * f).abs().min(1.0))
    }
}

#[inline]
fn ridge(n: f32) -> f32 {
    let r = 1.0 - n.abs().min(1.0);
    r * r
}

#[cfg(test)]
mod tests {
    use super::*;

    /// it should reproduce bit-identical values for identical seeds
    #[test]
    fn same_seed_is_deterministic() {
        let a = NoiseGenerator::new(42);
        let b = NoiseGenerator::new(42);
        for i in 0..200 {
            let x = i as f32 * 0.173;
            let y = i as f32 * -0.091;
            let z = i as f32 * 0.057;
            assert_eq!(a.noise1(x).to_bits(), b.noise1(x).to_bits());
            assert_eq!(a.noise2(x, y).to_bits(), b.noise2(x, y).to_bits());
            assert_eq!(a.noise3(x, y, z).to_bits(), b.noise3(x, y, z).to_bits());
            assert_eq!(
                a.noise4(x, y, z, x - y).to_bits(),
                b.noise4(x, y, z, x - y).to_bits()
            );
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = NoiseGenerator::new(42);
        let b = NoiseGenerator::new(43);
        let differs = (0..20).any(|i| {
            let x = i as f32 * 0.31 + 0.1;
            a.noise2(x, x * 0.7) != b.noise2(x, x * 0.7)
        });
        assert!(differs);
    }

    /// it should stay finite far from the origin, e.g. long-running time × frequency
    #[test]
    fn huge_coordinates_do_not_overflow() {
        let n = NoiseGenerator::new(1);
        for v in [3.0e9_f32, -3.0e9, 2.0e9] {
            let samples = [
                n.noise1(v),
                n.noise2(v, v),
                n.noise3(v, v, v),
                n.noise4(v, v, v, v),
                n.fbm3(v, 0.5, v, &Octaves::default()),
            ];
            for s in samples {
                assert!(s.is_finite(), "{v}: {s}");
            }
        }
    }

    #[test]
    fn raw_noise_stays_near_unit_range() {
        let n = NoiseGenerator::new(7);
        for i in 0..60 {
            for j in 0..60 {
                let x = i as f32 * 0.137 - 3.0;
                let y = j as f32 * 0.113 + 5.0;
                assert!(n.noise2(x, y).abs() <= 1.1);
                assert!(n.noise3(x, y, x * 0.5).abs() <= 1.2);
                assert!(n.noise4(x, y, 0.3, y * 0.25).abs() <= 1.25);
            }
        }
    }

    #[test]
    fn lattice_origin_is_zero() {
        let n = NoiseGenerator::new(1234);
        assert_eq!(n.noise2(0.0, 0.0), 0.0);
        assert_eq!(n.noise3(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn fractal_composites_respect_ranges() {
        let n = NoiseGenerator::new(99);
        let oct = Octaves::default();
        for i in 0..300 {
            let x = i as f32 * 0.071;
            let y = i as f32 * 0.043 + 1.0;
            let z = i as f32 * 0.029 - 2.0;
            assert!(n.fbm2(x, y, &oct).abs() <= 1.1);
            assert!(n.fbm3(x, y, z, &oct).abs() <= 1.2);
            let r = n.ridged2(x, y, &oct);
            assert!((-1.0..=1.0).contains(&r));
            let r = n.ridged3(x, y, z, &oct);
            assert!((-1.0..=1.0).contains(&r));
            let t = n.turbulence2(x, y, &oct);
            assert!((0.0..=1.0).contains(&t));
            let t = n.turbulence3(x, y, z, &oct);
            assert!((0.0..=1.0).contains(&t));
        }
    }

    #[test]
    fn zero_octaves_behaves_like_one() {
        let n = NoiseGenerator::new(5);
        let one = Octaves::new(1);
        let zero = Octaves::new(0);
        assert_eq!(n.fbm2(0.4, 1.7, &one), n.fbm2(0.4, 1.7, &zero));
        assert_eq!(n.fbm2(0.4, 1.7, &one), n.noise2(0.4, 1.7));
    }
}
