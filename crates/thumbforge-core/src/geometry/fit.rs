//! Aspect-ratio preserving fit computations.

use kurbo::{Point, Size};

/// Scale `asset` to fit entirely inside `target`, preserving aspect ratio.
pub fn fit_contain(asset: Size, target: Size) -> Size {
    if asset.width <= 0.0 || asset.height <= 0.0 || target.height <= 0.0 {
        return Size::ZERO;
    }
    let asset_ratio = asset.width / asset.height;
    let target_ratio = target.width / target.height;

    if asset_ratio > target_ratio {
        // Wider than the box: constrain by width
        Size::new(target.width, target.width / asset_ratio)
    } else {
        Size::new(target.height * asset_ratio, target.height)
    }
}

/// Scale `asset` to completely cover `target`, preserving aspect ratio.
pub fn fit_cover(asset: Size, target: Size) -> Size {
    if asset.width <= 0.0 || asset.height <= 0.0 || target.height <= 0.0 {
        return Size::ZERO;
    }
    let asset_ratio = asset.width / asset.height;
    let target_ratio = target.width / target.height;

    if asset_ratio > target_ratio {
        // Wider than the box: constrain by height, overflow horizontally
        Size::new(target.height * asset_ratio, target.height)
    } else {
        Size::new(target.width, target.width / asset_ratio)
    }
}

/// Top-left position that centers `size` inside `container`.
pub fn centered_origin(size: Size, container: Size) -> Point {
    Point::new(
        (container.width - size.width) / 2.0,
        (container.height - size.height) / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contain_wide_asset() {
        let fitted = fit_contain(Size::new(1000.0, 500.0), Size::new(400.0, 400.0));
        assert!((fitted.width - 400.0).abs() < 0.01);
        assert!((fitted.height - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_cover_wide_asset() {
        let fitted = fit_cover(Size::new(1000.0, 500.0), Size::new(400.0, 400.0));
        assert!((fitted.width - 800.0).abs() < 0.01);
        assert!((fitted.height - 400.0).abs() < 0.01);
    }

    #[test]
    fn test_contain_tall_asset() {
        let fitted = fit_contain(Size::new(300.0, 900.0), Size::new(1280.0, 720.0));
        assert!((fitted.height - 720.0).abs() < 0.01);
        assert!((fitted.width - 240.0).abs() < 0.01);
    }

    #[test]
    fn test_cover_never_smaller_than_contain() {
        let boxes = [Size::new(1280.0, 720.0), Size::new(100.0, 400.0), Size::new(50.0, 50.0)];
        let assets = [
            Size::new(1.0, 1.0),
            Size::new(4000.0, 10.0),
            Size::new(10.0, 4000.0),
            Size::new(1920.0, 1080.0),
            Size::new(333.0, 777.0),
        ];
        for target in boxes {
            for asset in assets {
                let contain = fit_contain(asset, target);
                let cover = fit_cover(asset, target);
                assert!(cover.area() + 1e-6 >= contain.area());
                assert!(contain.width <= target.width + 1e-6);
                assert!(contain.height <= target.height + 1e-6);
                assert!(cover.width + 1e-6 >= target.width);
                assert!(cover.height + 1e-6 >= target.height);
            }
        }
    }

    #[test]
    fn test_degenerate_asset() {
        assert_eq!(fit_contain(Size::new(0.0, 10.0), Size::new(10.0, 10.0)), Size::ZERO);
    }

    #[test]
    fn test_centered_origin() {
        let origin = centered_origin(Size::new(640.0, 360.0), Size::new(1280.0, 720.0));
        assert_eq!(origin, Point::new(320.0, 180.0));
    }
}
