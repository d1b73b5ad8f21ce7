//! Отображение полей заголовка в атрибуты датасета.

use fbank_types::{AttrValue, FilterbankHeader};

/// Метки осей `[time, IF, frequency]`.
pub const AXIS_LABELS: [&str; 3] = ["time", "feed_id", "frequency"];

/// Атрибуты датасета: по одному на поле заголовка, имя = имя поля.
///
/// Порядок фиксирован, типы: целые поля -> `Int`, вещественные -> `Double`,
/// строки -> `Str`.
pub fn header_attributes(header: &FilterbankHeader) -> Vec<(&'static str, AttrValue)> {
    vec![
        ("telescope_id", header.telescope_id.into()),
        ("machine_id", header.machine_id.into()),
        ("data_type", header.data_type.into()),
        ("rawdatafile", header.rawdatafile.as_str().into()),
        ("source_name", header.source_name.as_str().into()),
        ("az_start", header.az_start.into()),
        ("za_start", header.za_start.into()),
        ("src_raj", header.src_raj.into()),
        ("src_dej", header.src_dej.into()),
        ("tstart", header.tstart.into()),
        ("tsamp", header.tsamp.into()),
        ("nbits", header.nbits.into()),
        ("fch1", header.fch1.into()),
        ("foff", header.foff.into()),
        ("nchans", header.nchans.into()),
        ("nfpc", header.nfpc.into()),
        ("nifs", header.nifs.into()),
        ("ibeam", header.ibeam.into()),
        ("nbeams", header.nbeams.into()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_mapped_once() {
        let attrs = header_attributes(&FilterbankHeader::voyager1());
        assert_eq!(attrs.len(), 19);

        let mut names: Vec<_> = attrs.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 19);
    }

    #[test]
    fn test_attribute_types() {
        let attrs = header_attributes(&FilterbankHeader::voyager1());
        let get = |name: &str| attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| v);

        assert_eq!(get("nchans"), Some(&AttrValue::Int(65536)));
        assert_eq!(get("telescope_id"), Some(&AttrValue::Int(6)));
        assert_eq!(get("tsamp").and_then(|v| v.as_f64()), Some(18.253611008));
        assert_eq!(get("source_name").and_then(|v| v.as_str()), Some("Voyager1"));

        for double in ["az_start", "za_start", "src_raj", "src_dej", "tstart", "fch1", "foff"] {
            assert_eq!(get(double).map(|v| v.type_name()), Some("double"), "{double}");
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let header = FilterbankHeader::voyager1();
        assert_eq!(header_attributes(&header), header_attributes(&header));
    }
}
