// Distribution families: parameter names, validation and single draws

use super::algorithms::{
    beta, binomial, categorical, geometric, ln_std_gamma, negative_binomial, open01, poisson,
    skew_std_normal, std_cauchy, std_exp, std_gamma, std_normal, truncated_std_normal,
    von_mises, wald,
};
use super::SamplerError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported distribution families
///
/// Parameter names follow the usual probabilistic-programming conventions
/// (`sd` for a standard deviation, `tau` for a precision, `lam` for a rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Normal,
    TruncatedNormal,
    SkewNormal,
    Uniform,
    HalfNormal,
    Exponential,
    Laplace,
    Lognormal,
    LogitNormal,
    StudentT,
    Cauchy,
    HalfCauchy,
    Gamma,
    /// Gamma parameterized by its mean and standard deviation
    GammaMuSd,
    InverseGamma,
    ChiSquared,
    Beta,
    Kumaraswamy,
    Pareto,
    Weibull,
    Wald,
    VonMises,
    Gumbel,
    Logistic,
    Triangular,
    ExGaussian,
    Bernoulli,
    Binomial,
    BetaBinomial,
    Poisson,
    NegativeBinomial,
    Geometric,
    DiscreteUniform,
    DiscreteWeibull,
    Constant,
    ZeroInflatedPoisson,
    ZeroInflatedNegativeBinomial,
    ZeroInflatedBinomial,
    Categorical,
}

impl Family {
    pub const ALL: [Family; 39] = [
        Family::Normal,
        Family::TruncatedNormal,
        Family::SkewNormal,
        Family::Uniform,
        Family::HalfNormal,
        Family::Exponential,
        Family::Laplace,
        Family::Lognormal,
        Family::LogitNormal,
        Family::StudentT,
        Family::Cauchy,
        Family::HalfCauchy,
        Family::Gamma,
        Family::GammaMuSd,
        Family::InverseGamma,
        Family::ChiSquared,
        Family::Beta,
        Family::Kumaraswamy,
        Family::Pareto,
        Family::Weibull,
        Family::Wald,
        Family::VonMises,
        Family::Gumbel,
        Family::Logistic,
        Family::Triangular,
        Family::ExGaussian,
        Family::Bernoulli,
        Family::Binomial,
        Family::BetaBinomial,
        Family::Poisson,
        Family::NegativeBinomial,
        Family::Geometric,
        Family::DiscreteUniform,
        Family::DiscreteWeibull,
        Family::Constant,
        Family::ZeroInflatedPoisson,
        Family::ZeroInflatedNegativeBinomial,
        Family::ZeroInflatedBinomial,
        Family::Categorical,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Family::Normal => "normal",
            Family::TruncatedNormal => "truncated_normal",
            Family::SkewNormal => "skew_normal",
            Family::LogitNormal => "logit_normal",
            Family::GammaMuSd => "gamma_mu_sd",
            Family::Kumaraswamy => "kumaraswamy",
            Family::Wald => "wald",
            Family::VonMises => "von_mises",
            Family::BetaBinomial => "beta_binomial",
            Family::DiscreteWeibull => "discrete_weibull",
            Family::ZeroInflatedNegativeBinomial => "zero_inflated_negative_binomial",
            Family::ZeroInflatedBinomial => "zero_inflated_binomial",
            Family::Uniform => "uniform",
            Family::HalfNormal => "half_normal",
            Family::Exponential => "exponential",
            Family::Laplace => "laplace",
            Family::Lognormal => "lognormal",
            Family::StudentT => "student_t",
            Family::Cauchy => "cauchy",
            Family::HalfCauchy => "half_cauchy",
            Family::Gamma => "gamma",
            Family::InverseGamma => "inverse_gamma",
            Family::ChiSquared => "chi_squared",
            Family::Beta => "beta",
            Family::Pareto => "pareto",
            Family::Weibull => "weibull",
            Family::Gumbel => "gumbel",
            Family::Logistic => "logistic",
            Family::Triangular => "triangular",
            Family::ExGaussian => "ex_gaussian",
            Family::Bernoulli => "bernoulli",
            Family::Binomial => "binomial",
            Family::Poisson => "poisson",
            Family::NegativeBinomial => "negative_binomial",
            Family::Geometric => "geometric",
            Family::DiscreteUniform => "discrete_uniform",
            Family::Constant => "constant",
            Family::ZeroInflatedPoisson => "zero_inflated_poisson",
            Family::Categorical => "categorical",
        }
    }

    /// Broadcastable scalar parameters, in argument order
    pub fn scalar_params(&self) -> &'static [&'static str] {
        match self {
            Family::Normal | Family::LogitNormal | Family::GammaMuSd => &["mu", "sd"],
            Family::TruncatedNormal => &["mu", "sd", "lower", "upper"],
            Family::SkewNormal => &["mu", "sd", "alpha"],
            Family::Kumaraswamy => &["a", "b"],
            Family::Wald => &["mu", "lam", "alpha"],
            Family::VonMises => &["mu", "kappa"],
            Family::BetaBinomial => &["alpha", "beta", "n"],
            Family::DiscreteWeibull => &["q", "beta"],
            Family::ZeroInflatedNegativeBinomial => &["psi", "mu", "alpha"],
            Family::ZeroInflatedBinomial => &["psi", "n", "p"],
            Family::Uniform => &["lower", "upper"],
            Family::HalfNormal => &["tau"],
            Family::Exponential => &["lam"],
            Family::Laplace => &["mu", "b"],
            Family::Lognormal => &["mu", "tau"],
            Family::StudentT => &["nu", "mu", "lam"],
            Family::Cauchy => &["alpha", "beta"],
            Family::HalfCauchy => &["beta"],
            Family::Gamma | Family::InverseGamma | Family::Beta => &["alpha", "beta"],
            Family::ChiSquared => &["nu"],
            Family::Pareto => &["alpha", "m"],
            Family::Weibull => &["alpha", "beta"],
            Family::Gumbel => &["mu", "beta"],
            Family::Logistic => &["mu", "s"],
            Family::Triangular => &["lower", "c", "upper"],
            Family::ExGaussian => &["mu", "sigma", "nu"],
            Family::Bernoulli | Family::Geometric => &["p"],
            Family::Binomial => &["n", "p"],
            Family::Poisson => &["mu"],
            Family::NegativeBinomial => &["mu", "alpha"],
            Family::DiscreteUniform => &["lower", "upper"],
            Family::Constant => &["c"],
            Family::ZeroInflatedPoisson => &["psi", "theta"],
            Family::Categorical => &[],
        }
    }

    /// Event-shaped parameter consumed whole by each draw
    pub fn event_param(&self) -> Option<&'static str> {
        match self {
            Family::Categorical => Some("p"),
            _ => None,
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            Family::Bernoulli
                | Family::Binomial
                | Family::BetaBinomial
                | Family::Poisson
                | Family::NegativeBinomial
                | Family::Geometric
                | Family::DiscreteUniform
                | Family::DiscreteWeibull
                | Family::Constant
                | Family::ZeroInflatedPoisson
                | Family::ZeroInflatedNegativeBinomial
                | Family::ZeroInflatedBinomial
                | Family::Categorical
        )
    }

    /// Check one element's arguments (`args` in `scalar_params` order)
    pub fn validate(&self, args: &[f64], event: &[f64]) -> Result<(), SamplerError> {
        let names = self.scalar_params();
        for (name, value) in names.iter().zip(args) {
            if value.is_nan() {
                return Err(SamplerError::invalid(name, value, "must not be NaN"));
            }
        }

        let positive = |i: usize| -> Result<(), SamplerError> {
            if args[i] > 0.0 && args[i].is_finite() {
                Ok(())
            } else {
                Err(SamplerError::invalid(names[i], args[i], "must be positive"))
            }
        };
        let finite = |i: usize| -> Result<(), SamplerError> {
            if args[i].is_finite() {
                Ok(())
            } else {
                Err(SamplerError::invalid(names[i], args[i], "must be finite"))
            }
        };
        let probability = |i: usize| -> Result<(), SamplerError> {
            if (0.0..=1.0).contains(&args[i]) {
                Ok(())
            } else {
                Err(SamplerError::invalid(names[i], args[i], "must lie in [0, 1]"))
            }
        };
        let integral = |i: usize| -> Result<(), SamplerError> {
            if args[i].fract() == 0.0 && args[i].is_finite() {
                Ok(())
            } else {
                Err(SamplerError::invalid(names[i], args[i], "must be an integer"))
            }
        };
        let count = |i: usize| -> Result<(), SamplerError> {
            integral(i)?;
            if args[i] >= 0.0 {
                Ok(())
            } else {
                Err(SamplerError::invalid(names[i], args[i], "must be non-negative"))
            }
        };

        match self {
            Family::Normal
            | Family::Laplace
            | Family::Lognormal
            | Family::Gumbel
            | Family::Logistic
            | Family::Cauchy
            | Family::LogitNormal
            | Family::VonMises => {
                finite(0)?;
                positive(1)
            }
            Family::TruncatedNormal => {
                finite(0)?;
                positive(1)?;
                if args[2] < args[3] {
                    Ok(())
                } else {
                    Err(SamplerError::invalid("upper", args[3], "must exceed lower"))
                }
            }
            Family::SkewNormal => {
                finite(0)?;
                positive(1)?;
                finite(2)
            }
            Family::Wald => {
                positive(0)?;
                positive(1)?;
                finite(2)
            }
            Family::Uniform => {
                finite(0)?;
                finite(1)?;
                if args[0] < args[1] {
                    Ok(())
                } else {
                    Err(SamplerError::invalid("upper", args[1], "must exceed lower"))
                }
            }
            Family::HalfNormal
            | Family::Exponential
            | Family::HalfCauchy
            | Family::ChiSquared => positive(0),
            Family::StudentT => {
                positive(0)?;
                finite(1)?;
                positive(2)
            }
            Family::Gamma
            | Family::InverseGamma
            | Family::Beta
            | Family::Pareto
            | Family::Weibull
            | Family::GammaMuSd
            | Family::Kumaraswamy => {
                positive(0)?;
                positive(1)
            }
            Family::Triangular => {
                finite(0)?;
                finite(1)?;
                finite(2)?;
                if args[0] <= args[1] && args[1] <= args[2] && args[0] < args[2] {
                    Ok(())
                } else {
                    Err(SamplerError::invalid("c", args[1], "must lie in [lower, upper]"))
                }
            }
            Family::ExGaussian => {
                finite(0)?;
                positive(1)?;
                positive(2)
            }
            Family::Bernoulli => probability(0),
            Family::Geometric => {
                probability(0)?;
                if args[0] > 0.0 {
                    Ok(())
                } else {
                    Err(SamplerError::invalid("p", args[0], "must be positive"))
                }
            }
            Family::Binomial => {
                count(0)?;
                probability(1)
            }
            Family::BetaBinomial => {
                positive(0)?;
                positive(1)?;
                count(2)
            }
            Family::Poisson => positive(0),
            Family::NegativeBinomial => {
                positive(0)?;
                positive(1)
            }
            Family::DiscreteUniform => {
                integral(0)?;
                integral(1)?;
                if args[0] <= args[1] {
                    Ok(())
                } else {
                    Err(SamplerError::invalid("upper", args[1], "must not be below lower"))
                }
            }
            Family::DiscreteWeibull => {
                if !(args[0] > 0.0 && args[0] < 1.0) {
                    return Err(SamplerError::invalid("q", args[0], "must lie in (0, 1)"));
                }
                positive(1)
            }
            Family::Constant => integral(0),
            Family::ZeroInflatedPoisson => {
                probability(0)?;
                positive(1)
            }
            Family::ZeroInflatedNegativeBinomial => {
                probability(0)?;
                positive(1)?;
                positive(2)
            }
            Family::ZeroInflatedBinomial => {
                probability(0)?;
                count(1)?;
                probability(2)
            }
            Family::Categorical => {
                let ok = !event.is_empty()
                    && event.iter().all(|w| *w >= 0.0 && w.is_finite())
                    && event.iter().sum::<f64>() > 0.0;
                if ok {
                    Ok(())
                } else {
                    Err(SamplerError::invalid(
                        "p",
                        format!("{:?}", event),
                        "must be non-negative weights with a positive sum",
                    ))
                }
            }
        }
    }

    /// One variate; `args` must already be validated
    pub fn draw<R: Rng + ?Sized>(&self, args: &[f64], event: &[f64], rng: &mut R) -> f64 {
        match self {
            Family::Normal => args[0] + args[1] * std_normal(rng),
            Family::TruncatedNormal => {
                let (mu, sd) = (args[0], args[1]);
                let (a, b) = ((args[2] - mu) / sd, (args[3] - mu) / sd);
                mu + sd * truncated_std_normal(a, b, rng)
            }
            Family::SkewNormal => args[0] + args[1] * skew_std_normal(args[2], rng),
            Family::LogitNormal => {
                let y = args[0] + args[1] * std_normal(rng);
                1.0 / (1.0 + (-y).exp())
            }
            Family::GammaMuSd => {
                let (mu, sd) = (args[0], args[1]);
                let variance = sd * sd;
                std_gamma(mu * mu / variance, rng) * variance / mu
            }
            Family::Kumaraswamy => {
                // Inverse of F(x) = 1 - (1 - x^a)^b
                let (a, b) = (args[0], args[1]);
                let u = open01(rng);
                (-((-u).ln_1p() / b).exp_m1()).powf(1.0 / a)
            }
            Family::Wald => args[2] + wald(args[0], args[1], rng),
            Family::VonMises => args[0] + von_mises(args[1], rng),
            Family::Uniform => args[0] + (args[1] - args[0]) * rng.gen::<f64>(),
            Family::HalfNormal => std_normal(rng).abs() / args[0].sqrt(),
            Family::Exponential => std_exp(rng) / args[0],
            Family::Laplace => {
                let u = open01(rng) - 0.5;
                args[0] - args[1] * u.signum() * (1.0 - 2.0 * u.abs()).ln()
            }
            Family::Lognormal => (args[0] + std_normal(rng) / args[1].sqrt()).exp(),
            Family::StudentT => {
                let (nu, mu, lam) = (args[0], args[1], args[2]);
                let chi2 = 2.0 * std_gamma(nu / 2.0, rng);
                mu + std_normal(rng) / lam.sqrt() / (chi2 / nu).sqrt()
            }
            Family::Cauchy => args[0] + args[1] * std_cauchy(rng),
            Family::HalfCauchy => (args[0] * std_cauchy(rng)).abs(),
            Family::Gamma => std_gamma(args[0], rng) / args[1],
            Family::InverseGamma => (args[1].ln() - ln_std_gamma(args[0], rng)).exp(),
            Family::ChiSquared => 2.0 * std_gamma(args[0] / 2.0, rng),
            Family::Beta => beta(args[0], args[1], rng),
            Family::Pareto => args[1] * (std_exp(rng) / args[0]).exp(),
            Family::Weibull => args[1] * std_exp(rng).powf(1.0 / args[0]),
            Family::Gumbel => args[0] - args[1] * std_exp(rng).ln(),
            Family::Logistic => {
                let u = open01(rng);
                args[0] + args[1] * (u / (1.0 - u)).ln()
            }
            Family::Triangular => {
                let (lower, c, upper) = (args[0], args[1], args[2]);
                let u = rng.gen::<f64>();
                let split = (c - lower) / (upper - lower);
                if u < split {
                    lower + (u * (upper - lower) * (c - lower)).sqrt()
                } else {
                    upper - ((1.0 - u) * (upper - lower) * (upper - c)).sqrt()
                }
            }
            Family::ExGaussian => args[0] + args[1] * std_normal(rng) + args[2] * std_exp(rng),
            Family::Bernoulli => {
                if rng.gen::<f64>() < args[0] {
                    1.0
                } else {
                    0.0
                }
            }
            Family::Binomial => binomial(args[0] as u64, args[1], rng) as f64,
            Family::BetaBinomial => {
                let p = beta(args[0], args[1], rng);
                binomial(args[2] as u64, p, rng) as f64
            }
            Family::Poisson => poisson(args[0], rng) as f64,
            Family::NegativeBinomial => negative_binomial(args[0], args[1], rng) as f64,
            Family::Geometric => geometric(args[0], rng) as f64,
            Family::DiscreteUniform => {
                let (lower, upper) = (args[0], args[1]);
                let span = upper - lower + 1.0;
                (lower + (rng.gen::<f64>() * span).floor()).min(upper)
            }
            Family::DiscreteWeibull => {
                // P(X >= x) = q^(x^beta)
                let (q, shape) = (args[0], args[1]);
                let t = ((-open01(rng)).ln_1p() / q.ln()).powf(1.0 / shape);
                (t.ceil() - 1.0).max(0.0)
            }
            Family::Constant => args[0],
            Family::ZeroInflatedPoisson => {
                if rng.gen::<f64>() < args[0] {
                    poisson(args[1], rng) as f64
                } else {
                    0.0
                }
            }
            Family::ZeroInflatedNegativeBinomial => {
                if rng.gen::<f64>() < args[0] {
                    negative_binomial(args[1], args[2], rng) as f64
                } else {
                    0.0
                }
            }
            Family::ZeroInflatedBinomial => {
                if rng.gen::<f64>() < args[0] {
                    binomial(args[1] as u64, args[2], rng) as f64
                } else {
                    0.0
                }
            }
            Family::Categorical => categorical(event, rng) as f64,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Family::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| SamplerError::UnknownFamily(s.to_string()))
    }
}
