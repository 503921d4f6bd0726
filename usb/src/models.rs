use buudai_types::Model;

pub const VID_HANTEK: u16 = 0x04b5;
pub const VID_BUUDAI: u16 = 0x8102;

pub const PID_DSO_2090: u16 = 0x2090;
pub const PID_DSO_2150: u16 = 0x2150;
pub const PID_DSO_2250: u16 = 0x2250;
pub const PID_DSO_5200: u16 = 0x5200;
pub const PID_DSO_5200A: u16 = 0x520a;
pub const PID_BM102: u16 = 0x8102;

#[derive(Debug, PartialEq, Eq)]
pub struct KnownModel {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: &'static str,
    pub model: Model,
}

impl KnownModel {
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// Every oscilloscope we're able to drive. Searched in order, so the first entry wins if
/// two ever share an identifier.
pub static KNOWN_MODELS: &[KnownModel] = &[
    KnownModel {
        vendor_id: VID_HANTEK,
        product_id: PID_DSO_2090,
        name: "DSO-2090",
        model: Model::Dso2090,
    },
    KnownModel {
        vendor_id: VID_HANTEK,
        product_id: PID_DSO_2150,
        name: "DSO-2150",
        model: Model::Dso2150,
    },
    KnownModel {
        vendor_id: VID_HANTEK,
        product_id: PID_DSO_2250,
        name: "DSO-2250",
        model: Model::Dso2250,
    },
    KnownModel {
        vendor_id: VID_HANTEK,
        product_id: PID_DSO_5200,
        name: "DSO-5200",
        model: Model::Dso5200,
    },
    KnownModel {
        vendor_id: VID_HANTEK,
        product_id: PID_DSO_5200A,
        name: "DSO-5200A",
        model: Model::Dso5200A,
    },
    KnownModel {
        vendor_id: VID_BUUDAI,
        product_id: PID_BM102,
        name: "Buudai BM102",
        model: Model::Bm102,
    },
];

pub fn find_model(
    models: &'static [KnownModel],
    vendor_id: u16,
    product_id: u16,
) -> Option<&'static KnownModel> {
    models
        .iter()
        .find(|known| known.matches(vendor_id, product_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn every_model_has_an_entry() {
        let listed: HashSet<Model> = KNOWN_MODELS.iter().map(|known| known.model).collect();
        for model in Model::iter().filter(Model::is_known) {
            assert!(listed.contains(&model), "{} missing from table", model);
        }
        assert!(!listed.contains(&Model::Unknown));
    }

    #[test]
    fn lookup_uses_vendor_and_product() {
        let found = find_model(KNOWN_MODELS, VID_HANTEK, PID_DSO_2250).unwrap();
        assert_eq!(found.model, Model::Dso2250);

        // Right product, wrong vendor.
        assert!(find_model(KNOWN_MODELS, VID_BUUDAI, PID_DSO_2250).is_none());
    }

    #[test]
    fn first_entry_wins() {
        static DUPLICATES: &[KnownModel] = &[
            KnownModel {
                vendor_id: 0x1234,
                product_id: 0x0001,
                name: "First",
                model: Model::Dso2090,
            },
            KnownModel {
                vendor_id: 0x1234,
                product_id: 0x0001,
                name: "Second",
                model: Model::Dso2150,
            },
        ];

        let found = find_model(DUPLICATES, 0x1234, 0x0001).unwrap();
        assert_eq!(found.name, "First");
    }
}
