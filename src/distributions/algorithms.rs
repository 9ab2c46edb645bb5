//! Variate generation from uniform draws
//!
//! These are the candidate implementations checked by the harness, so they
//! deliberately avoid `rand_distr`: inverse-CDF transforms where a closed
//! form exists, Marsaglia–Tsang for gamma variates, PTRS (Hörmann 1993) for
//! large-mean Poisson and Knuth's beta splitting for large binomials.
//! Truncated normals use Robert's (1995) rejection samplers, von Mises
//! variates Best and Fisher's (1979) wrapped-Cauchy envelope.

use rand::Rng;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

/// Uniform on the open interval (0, 1)
pub fn open01<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u: f64 = rng.gen();
        if u > 0.0 {
            return u;
        }
    }
}

/// Standard normal via Marsaglia's polar method
pub fn std_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let x = 2.0 * rng.gen::<f64>() - 1.0;
        let y = 2.0 * rng.gen::<f64>() - 1.0;
        let s = x * x + y * y;
        if s > 0.0 && s < 1.0 {
            return x * (-2.0 * s.ln() / s).sqrt();
        }
    }
}

/// Standard exponential by inversion
pub fn std_exp<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    -open01(rng).ln()
}

/// Standard Cauchy by inversion
pub fn std_cauchy<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (PI * (open01(rng) - 0.5)).tan()
}

/// Gamma(shape, 1) via Marsaglia–Tsang
///
/// Shapes below one are boosted: `G(a) = G(a + 1) * U^(1/a)`.
pub fn std_gamma<R: Rng + ?Sized>(shape: f64, rng: &mut R) -> f64 {
    if shape < 1.0 {
        return std_gamma(shape + 1.0, rng) * open01(rng).powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let (x, v) = loop {
            let x = std_normal(rng);
            let v = 1.0 + c * x;
            if v > 0.0 {
                break (x, v * v * v);
            }
        };
        let u = open01(rng);
        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// Log of a Gamma(shape, 1) variate; stays finite for tiny shapes
pub fn ln_std_gamma<R: Rng + ?Sized>(shape: f64, rng: &mut R) -> f64 {
    if shape < 1.0 {
        std_gamma(shape + 1.0, rng).ln() + open01(rng).ln() / shape
    } else {
        std_gamma(shape, rng).ln()
    }
}

/// Beta(a, b) as a ratio of gammas, computed in log space
pub fn beta<R: Rng + ?Sized>(a: f64, b: f64, rng: &mut R) -> f64 {
    let ln_x = ln_std_gamma(a, rng);
    let ln_y = ln_std_gamma(b, rng);
    1.0 / (1.0 + (ln_y - ln_x).exp())
}

/// Poisson(mu)
pub fn poisson<R: Rng + ?Sized>(mu: f64, rng: &mut R) -> u64 {
    if mu <= 0.0 {
        return 0;
    }
    if mu < 10.0 {
        poisson_mult(mu, rng)
    } else {
        poisson_ptrs(mu, rng)
    }
}

/// Knuth's multiplication method
fn poisson_mult<R: Rng + ?Sized>(mu: f64, rng: &mut R) -> u64 {
    let limit = (-mu).exp();
    let mut k = 0;
    let mut prod = rng.gen::<f64>();
    while prod > limit {
        k += 1;
        prod *= rng.gen::<f64>();
    }
    k
}

/// Transformed rejection with squeeze (PTRS)
fn poisson_ptrs<R: Rng + ?Sized>(mu: f64, rng: &mut R) -> u64 {
    let slam = mu.sqrt();
    let loglam = mu.ln();
    let b = 0.931 + 2.53 * slam;
    let a = -0.059 + 0.02483 * b;
    let inv_alpha = 1.1239 + 1.1328 / (b - 3.4);
    let vr = 0.9277 - 3.6224 / (b - 2.0);

    loop {
        let u = rng.gen::<f64>() - 0.5;
        let v = rng.gen::<f64>();
        let us = 0.5 - u.abs();
        let k = ((2.0 * a / us + b) * u + mu + 0.43).floor();

        if us >= 0.07 && v <= vr {
            return k as u64;
        }
        if k < 0.0 || (us < 0.013 && v > us) {
            continue;
        }
        let lhs = v.ln() + inv_alpha.ln() - (a / (us * us) + b).ln();
        let rhs = -mu + k * loglam - ln_gamma(k + 1.0);
        if lhs <= rhs {
            return k as u64;
        }
    }
}

/// Negative binomial with mean `mu` and dispersion `alpha`, as a
/// gamma-mixed Poisson
pub fn negative_binomial<R: Rng + ?Sized>(mu: f64, alpha: f64, rng: &mut R) -> u64 {
    let rate = std_gamma(alpha, rng) * mu / alpha;
    poisson(rate, rng)
}

/// Below this many trials binomials are drawn by inversion
const BINOMIAL_INVERSION_LIMIT: u64 = 30;

/// Binomial(n, p)
pub fn binomial<R: Rng + ?Sized>(n: u64, p: f64, rng: &mut R) -> u64 {
    let mut n = n;
    let mut p = p;
    let mut offset = 0;

    // Knuth 3.4.1: the a-th order statistic of n uniforms is Beta(a, n - a + 1)
    while n > BINOMIAL_INVERSION_LIMIT {
        let a = 1 + n / 2;
        let b = n - a + 1;
        let x = beta(a as f64, b as f64, rng);
        if x >= p {
            n = a - 1;
            p /= x;
        } else {
            offset += a;
            n = b - 1;
            p = (p - x) / (1.0 - x);
        }
    }

    offset + binomial_inversion(n, p.clamp(0.0, 1.0), rng)
}

fn binomial_inversion<R: Rng + ?Sized>(n: u64, p: f64, rng: &mut R) -> u64 {
    if n == 0 || p == 0.0 {
        return 0;
    }
    if p == 1.0 {
        return n;
    }

    let flipped = p > 0.5;
    let q = if flipped { 1.0 - p } else { p };
    let ratio = q / (1.0 - q);

    let mut u = rng.gen::<f64>();
    let mut prob = (1.0 - q).powi(n as i32);
    let mut k = 0;
    while u > prob && k < n {
        u -= prob;
        prob *= ratio * (n - k) as f64 / (k + 1) as f64;
        k += 1;
    }

    if flipped {
        n - k
    } else {
        k
    }
}

/// Number of trials up to and including the first success
pub fn geometric<R: Rng + ?Sized>(p: f64, rng: &mut R) -> u64 {
    if p >= 1.0 {
        return 1;
    }
    1 + (open01(rng).ln() / (-p).ln_1p()).floor() as u64
}

/// Inverse Gaussian(mu, lam) via Michael, Schucany and Haas
///
/// The smaller root is computed as `mu - 2 mu^2 y / (sqrt(D) + mu y)` to
/// avoid cancellation when `mu` is large relative to `lam`.
pub fn wald<R: Rng + ?Sized>(mu: f64, lam: f64, rng: &mut R) -> f64 {
    let n = std_normal(rng);
    let y = n * n;
    let my = mu * y;
    let root = mu - 2.0 * mu * my / ((4.0 * mu * lam * y + my * my).sqrt() + my);
    if rng.gen::<f64>() * (mu + root) <= mu {
        root
    } else {
        mu * mu / root
    }
}

/// Von Mises(0, kappa) on [-pi, pi], Best–Fisher rejection
pub fn von_mises<R: Rng + ?Sized>(kappa: f64, rng: &mut R) -> f64 {
    if kappa < 1e-8 {
        return PI * (2.0 * rng.gen::<f64>() - 1.0);
    }

    let tau = 1.0 + (1.0 + 4.0 * kappa * kappa).sqrt();
    let rho = (tau - (2.0 * tau).sqrt()) / (2.0 * kappa);
    let r = (1.0 + rho * rho) / (2.0 * rho);

    let f = loop {
        let z = (PI * rng.gen::<f64>()).cos();
        let f = (1.0 + r * z) / (r + z);
        let c = kappa * (r - f);
        let u = open01(rng);
        if c * (2.0 - c) > u || (c / u).ln() + 1.0 - c >= 0.0 {
            break f;
        }
    };

    let theta = f.clamp(-1.0, 1.0).acos();
    if rng.gen::<bool>() {
        theta
    } else {
        -theta
    }
}

/// Standard normal restricted to `[a, b]` (`a < b`, either may be infinite)
pub fn truncated_std_normal<R: Rng + ?Sized>(a: f64, b: f64, rng: &mut R) -> f64 {
    if b <= 0.0 {
        return -truncated_std_normal(-b, -a, rng);
    }

    if a <= 0.0 {
        // Interval straddles zero
        if b - a >= (2.0 * PI).sqrt() {
            loop {
                let z = std_normal(rng);
                if a <= z && z <= b {
                    return z;
                }
            }
        }
        loop {
            let z = a + (b - a) * rng.gen::<f64>();
            if rng.gen::<f64>() <= (-0.5 * z * z).exp() {
                return z;
            }
        }
    }

    // One-sided tail [a, b] with a > 0
    let alpha = 0.5 * (a + (a * a + 4.0).sqrt());
    if b - a > 1.0 / alpha {
        loop {
            let z = a + std_exp(rng) / alpha;
            if z <= b && rng.gen::<f64>() <= (-0.5 * (z - alpha) * (z - alpha)).exp() {
                return z;
            }
        }
    }
    loop {
        let z = a + (b - a) * rng.gen::<f64>();
        if rng.gen::<f64>() <= (0.5 * (a * a - z * z)).exp() {
            return z;
        }
    }
}

/// Skew-normal(0, 1, alpha) by Azzalini's sign-flip construction
pub fn skew_std_normal<R: Rng + ?Sized>(alpha: f64, rng: &mut R) -> f64 {
    let u = std_normal(rng);
    let v = std_normal(rng);
    if v <= alpha * u {
        u
    } else {
        -u
    }
}

/// Index drawn with probability proportional to `weights`
pub fn categorical<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    let mut u = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if u < *w {
            return i;
        }
        u -= w;
    }
    // Rounding can leave u just above the last cumulative weight
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mean_var(xs: &[f64]) -> (f64, f64) {
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        (mean, var)
    }

    #[test]
    fn test_std_normal_moments() {
        let mut rng = StdRng::seed_from_u64(0);
        let xs: Vec<f64> = (0..100_000).map(|_| std_normal(&mut rng)).collect();
        let (mean, var) = mean_var(&xs);
        assert!(mean.abs() < 0.02, "mean={mean}");
        assert!((0.97..=1.03).contains(&var), "var={var}");
    }

    #[test]
    fn test_std_gamma_moments() {
        let mut rng = StdRng::seed_from_u64(1);
        for shape in [0.5, 1.0, 4.0, 20.0] {
            let xs: Vec<f64> = (0..100_000).map(|_| std_gamma(shape, &mut rng)).collect();
            let (mean, var) = mean_var(&xs);
            assert!((mean - shape).abs() < 0.05 * shape.max(1.0), "shape={shape} mean={mean}");
            assert!((var - shape).abs() < 0.1 * shape.max(1.0), "shape={shape} var={var}");
        }
    }

    #[test]
    fn test_beta_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..10_000 {
            let x = beta(0.01, 0.01, &mut rng);
            assert!((0.0..=1.0).contains(&x));
        }
    }

    #[test]
    fn test_poisson_moments_both_regimes() {
        let mut rng = StdRng::seed_from_u64(3);
        for mu in [0.5, 5.0, 20.0, 300.0] {
            let xs: Vec<f64> = (0..100_000).map(|_| poisson(mu, &mut rng) as f64).collect();
            let (mean, var) = mean_var(&xs);
            let tol = 8.0 * (mu / 100_000.0).sqrt() + 0.02;
            assert!((mean - mu).abs() <= tol, "mu={mu} mean={mean}");
            assert!((var - mu).abs() <= 0.1 * mu.max(1.0), "mu={mu} var={var}");
        }
    }

    #[test]
    fn test_binomial_large_n_uses_splitting() {
        let mut rng = StdRng::seed_from_u64(4);
        let (n, p) = (1_000u64, 0.3);
        let xs: Vec<f64> = (0..50_000).map(|_| binomial(n, p, &mut rng) as f64).collect();
        let (mean, var) = mean_var(&xs);
        assert!((mean - 300.0).abs() < 1.0, "mean={mean}");
        assert!((var - 210.0).abs() < 10.0, "var={var}");
        assert!(xs.iter().all(|x| *x <= n as f64));
    }

    #[test]
    fn test_binomial_edges() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(binomial(0, 0.5, &mut rng), 0);
        assert_eq!(binomial(7, 0.0, &mut rng), 0);
        assert_eq!(binomial(7, 1.0, &mut rng), 7);
    }

    #[test]
    fn test_geometric_support_starts_at_one() {
        let mut rng = StdRng::seed_from_u64(6);
        assert_eq!(geometric(1.0, &mut rng), 1);
        let xs: Vec<f64> = (0..50_000).map(|_| geometric(0.25, &mut rng) as f64).collect();
        assert!(xs.iter().all(|x| *x >= 1.0));
        let (mean, _) = mean_var(&xs);
        assert!((mean - 4.0).abs() < 0.1, "mean={mean}");
    }

    #[test]
    fn test_categorical_respects_zero_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert_eq!(categorical(&[0.0, 1.0, 0.0], &mut rng), 1);
        }
    }

    #[test]
    fn test_wald_moments() {
        let mut rng = StdRng::seed_from_u64(8);
        for (mu, lam) in [(1.0, 1.0), (20.0, 0.5), (0.5, 20.0)] {
            let xs: Vec<f64> = (0..200_000).map(|_| wald(mu, lam, &mut rng)).collect();
            assert!(xs.iter().all(|x| *x > 0.0));
            let (mean, _) = mean_var(&xs);
            let tol = 0.05 * mu.max(1.0) * (mu / lam).sqrt().max(1.0);
            assert!((mean - mu).abs() < tol, "mu={mu} lam={lam} mean={mean}");
        }
    }

    #[test]
    fn test_von_mises_concentrates() {
        let mut rng = StdRng::seed_from_u64(9);
        let xs: Vec<f64> = (0..50_000).map(|_| von_mises(100.0, &mut rng)).collect();
        assert!(xs.iter().all(|x| (-PI..=PI).contains(x)));
        let (mean, var) = mean_var(&xs);
        assert!(mean.abs() < 0.01, "mean={mean}");
        // Var ~ 1/kappa for large kappa
        assert!((var - 0.01).abs() < 0.001, "var={var}");

        let flat: Vec<f64> = (0..50_000).map(|_| von_mises(1e-10, &mut rng)).collect();
        let (_, var) = mean_var(&flat);
        assert!((var - PI * PI / 3.0).abs() < 0.1, "var={var}");
    }

    #[test]
    fn test_truncated_std_normal_stays_inside() {
        let mut rng = StdRng::seed_from_u64(10);
        let bounds = [
            (-0.5, 0.5),
            (-1.0, f64::INFINITY),
            (f64::NEG_INFINITY, -3.0),
            (3.2, 44.0),
            (5.0, 5.1),
            (-44.0, -3.2),
        ];
        for (a, b) in bounds {
            for _ in 0..5_000 {
                let z = truncated_std_normal(a, b, &mut rng);
                assert!(a <= z && z <= b, "z={z} outside [{a}, {b}]");
            }
        }
    }

    #[test]
    fn test_truncated_std_normal_tail_mean() {
        // E[Z | Z > 3] = phi(3) / (1 - Phi(3)) ~ 3.2831
        let mut rng = StdRng::seed_from_u64(11);
        let xs: Vec<f64> = (0..100_000)
            .map(|_| truncated_std_normal(3.0, f64::INFINITY, &mut rng))
            .collect();
        let (mean, _) = mean_var(&xs);
        assert!((mean - 3.2831).abs() < 0.01, "mean={mean}");
    }

    #[test]
    fn test_skew_std_normal_mean() {
        // E = sqrt(2/pi) * alpha / sqrt(1 + alpha^2)
        let mut rng = StdRng::seed_from_u64(12);
        let alpha: f64 = 5.0;
        let xs: Vec<f64> = (0..100_000).map(|_| skew_std_normal(alpha, &mut rng)).collect();
        let (mean, _) = mean_var(&xs);
        let expected = (2.0 / PI).sqrt() * alpha / (1.0 + alpha * alpha).sqrt();
        assert!((mean - expected).abs() < 0.01, "mean={mean}");
    }
}
