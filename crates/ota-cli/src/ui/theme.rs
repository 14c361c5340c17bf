//! UI Theme - colors and icons for the run summary

use crossterm::style::Color;

/// Visual constants for the summary
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Colors for different UI elements
    pub colors: ColorScheme,
    /// Status icons
    pub icons: Icons,
}

/// Color scheme for UI elements
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Package file names
    pub package_name: Color,
    /// Details and counts
    pub secondary: Color,
    /// Headers and labels
    pub header: Color,
    /// Built or uploaded
    pub success: Color,
    /// Kept as-is
    pub existing: Color,
    /// Failed
    pub error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            package_name: Color::Cyan,
            secondary: Color::DarkGrey,
            header: Color::White,
            success: Color::Green,
            existing: Color::Yellow,
            error: Color::Red,
        }
    }
}

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Built/uploaded (✓)
    pub success: &'static str,
    /// Already present (○)
    pub existing: &'static str,
    /// Failed (✗)
    pub error: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            success: "✓",
            existing: "○",
            error: "✗",
        }
    }
}
