//! Place command - compute hover preview placement.

use clap::Args;
use serde::Serialize;
use vitrail::carton::{Rect, Size};
use vitrail::musea::{place, Placement, PlacementOptions};

use super::{parse_numbers, CommandError};

#[derive(Args)]
pub struct PlaceArgs {
    /// Anchor rectangle as x,y,width,height
    #[arg(long)]
    pub anchor: String,

    /// Preview size as width,height
    #[arg(long, default_value = "400,300")]
    pub size: String,

    /// Viewport size as width,height
    #[arg(long, default_value = "1280,720")]
    pub viewport: String,

    /// Horizontal gap between anchor and preview
    #[arg(long, default_value_t = 20.0)]
    pub offset: f64,

    /// Vertical shift from the anchor's top edge
    #[arg(long, default_value_t = 0.0)]
    pub offset_y: f64,
}

#[derive(Serialize)]
struct PlaceOutput {
    #[serde(flatten)]
    placement: Placement,
    rect: Rect,
    fits: bool,
}

pub fn run(args: PlaceArgs) -> Result<String, CommandError> {
    let [x, y, width, height] = parse_numbers::<4>("anchor", &args.anchor)?;
    let [w, h] = parse_numbers::<2>("size", &args.size)?;
    let [vw, vh] = parse_numbers::<2>("viewport", &args.viewport)?;
    if !args.offset.is_finite() || !args.offset_y.is_finite() {
        return Err(CommandError::Usage("offsets must be finite numbers".into()));
    }

    let size = Size::new(w, h);
    let viewport = Size::new(vw, vh);
    let options = PlacementOptions {
        offset_x: args.offset,
        offset_y: args.offset_y,
        ..PlacementOptions::default()
    };
    let placement = place(Rect::new(x, y, width, height), size, viewport, &options);
    let rect = placement.rect(size);
    let output = PlaceOutput {
        placement,
        rect,
        fits: rect.is_within(&viewport),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(anchor: &str) -> PlaceArgs {
        PlaceArgs {
            anchor: anchor.to_owned(),
            size: "400,300".to_owned(),
            viewport: "1280,720".to_owned(),
            offset: 20.0,
            offset_y: 0.0,
        }
    }

    #[test]
    fn test_right_edge_flip() {
        let output: serde_json::Value =
            serde_json::from_str(&run(args("1000,100,200,40")).unwrap()).unwrap();
        assert_eq!(output["x"], 580.0);
        assert_eq!(output["side"], "left");
        assert_eq!(output["flipped"], false);
        assert_eq!(output["fits"], true);
        assert_eq!(output["rect"]["width"], 400.0);
    }

    #[test]
    fn test_output_shape() {
        insta::assert_snapshot!(run(args("100,100,200,40")).unwrap(), @r#"
        {
          "x": 320.0,
          "y": 100.0,
          "side": "right",
          "flipped": false,
          "rect": {
            "x": 320.0,
            "y": 100.0,
            "width": 400.0,
            "height": 300.0
          },
          "fits": true
        }
        "#);
    }

    #[test]
    fn test_malformed_anchor() {
        assert!(matches!(run(args("1000,100")), Err(CommandError::Usage(_))));
    }
}
