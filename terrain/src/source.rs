use dem::{DemError, GeoTiff};
use geo::geometry::Coord;

/// A terrain surface that can be queried for elevations.
///
/// Implementations answer a whole batch at once and must return one
/// result per query, in query order. A query that cannot be answered
/// is an `Err` for that point only.
pub trait ElevationSource {
    type Error: std::error::Error;

    /// Returns the value this source reports for cells without a
    /// measurement, if it has one.
    fn nodata(&self) -> Option<f64>;

    /// Returns the raw elevation, in meters, at each coordinate of
    /// `batch` (`x` longitude, `y` latitude).
    fn sample(&self, batch: &[Coord<f64>]) -> Vec<Result<f64, Self::Error>>;
}

impl<S: ElevationSource + ?Sized> ElevationSource for &S {
    type Error = S::Error;

    fn nodata(&self) -> Option<f64> {
        (**self).nodata()
    }

    fn sample(&self, batch: &[Coord<f64>]) -> Vec<Result<f64, Self::Error>> {
        (**self).sample(batch)
    }
}

impl ElevationSource for GeoTiff {
    type Error = DemError;

    fn nodata(&self) -> Option<f64> {
        GeoTiff::nodata(self).map(f64::from)
    }

    fn sample(&self, batch: &[Coord<f64>]) -> Vec<Result<f64, DemError>> {
        batch
            .iter()
            .map(|coord| self.get(*coord).map(f64::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ElevationSource;
    use crate::Sampler;
    use dem::{Bounds, GeoTiff};
    use geo::coord;
    use std::fs::File;
    use tempfile::TempDir;
    use tiff::{
        encoder::{colortype, TiffEncoder},
        tags::Tag,
    };

    #[test]
    fn test_geotiff_source() {
        let bounds = Bounds {
            min_lat: 0.0,
            max_lat: 1.0,
            min_lon: 0.0,
            max_lon: 2.0,
        };
        let dem = GeoTiff::from_parts(vec![5.0, -1.0], 2, 1, bounds, Some(-1.0)).unwrap();
        assert_eq!(ElevationSource::nodata(&dem), Some(-1.0));

        let values = dem.sample(&[
            coord!(x: 0.5, y: 0.5),
            coord!(x: 3.0, y: 0.5),
            coord!(x: 1.5, y: 0.5),
        ]);
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].as_ref().unwrap(), &5.0);
        assert!(values[1].is_err());
        assert_eq!(values[2].as_ref().unwrap(), &-1.0);
    }

    #[test]
    fn test_geotiff_file_nodata_is_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dem.tif");
        {
            let mut file = File::create(&path).unwrap();
            let mut tiff = TiffEncoder::new(&mut file).unwrap();
            let mut image = tiff.new_image::<colortype::Gray16>(2, 1).unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelPixelScaleTag, &[0.5_f64, 1.0, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelTiepointTag, &[0.0_f64, 0.0, 0.0, 37.0, 56.0, 0.0][..])
                .unwrap();
            image.encoder().write_tag(Tag::GdalNodata, "0").unwrap();
            image.write_data(&[184_u16, 0]).unwrap();
        }

        let dem = GeoTiff::open(&path).unwrap();
        let elevations = Sampler::new(10).unwrap().sample(
            &dem,
            &[
                coord!(x: 37.2, y: 55.5),
                coord!(x: 37.8, y: 55.5),
                coord!(x: 39.0, y: 55.5),
            ],
        );
        assert_eq!(elevations.values, vec![Some(184.0), None, None]);
        assert_eq!(elevations.nodata, 1);
        assert_eq!(elevations.failed, 1);
    }
}
