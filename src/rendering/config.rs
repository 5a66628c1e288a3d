#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Sample count of the color and depth targets. 1 disables MSAA.
    pub msaa_samples: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { msaa_samples: 4 }
    }
}
