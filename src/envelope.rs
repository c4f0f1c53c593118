/// Easing applied to the segment that starts at a keyframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ease {
    #[default]
    Linear,
    /// Classic smoothstep, 3x^2 - 2x^3.
    Smooth,
    /// Smootherstep, 6x^5 - 15x^4 + 10x^3.
    Cubic,
}

impl Ease {
    pub fn apply(self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Self::Linear => x,
            Self::Smooth => x * x * (3.0 - 2.0 * x),
            Self::Cubic => x * x * x * (x * (x * 6.0 - 15.0) + 10.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub t: f64,
    pub v: f64,
    #[serde(default, skip_serializing_if = "is_linear")]
    pub ease: Ease,
}

fn is_linear(e: &Ease) -> bool {
    *e == Ease::Linear
}

/// Piecewise interpolator over sorted keyframes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Envelope {
    pub keys: Vec<Keyframe>,
}

impl Envelope {
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }

    /// Value at time `t` seconds. Empty envelopes evaluate to 0; times
    /// outside the key range clamp to the endpoint values.
    pub fn eval(&self, t: f64) -> f64 {
        let n = self.keys.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 || t <= self.keys[0].t {
            return self.keys[0].v;
        }
        if t >= self.keys[n - 1].t {
            return self.keys[n - 1].v;
        }
        for w in self.keys.windows(2) {
            let (a, b) = (w[0], w[1]);
            if t >= a.t && t <= b.t {
                let den = b.t - a.t;
                if den <= 0.0 {
                    return b.v;
                }
                let u = a.ease.apply(((t - a.t) / den).clamp(0.0, 1.0));
                return a.v + (b.v - a.v) * u;
            }
        }
        self.keys[n - 1].v
    }

    /// Boolean view: thresholded at 0.5.
    pub fn eval_bool(&self, t: f64) -> bool {
        self.eval(t) >= 0.5
    }
}
