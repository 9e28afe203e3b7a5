//! Built-in wholesale catalog.
//!
//! Ten products across four piece types and a boxed set. Prices are per
//! wholesale pack in CLP.

use aurelia_core::Language;

use super::{Catalog, Product, Translations};

/// Build the storefront's fixed catalog.
#[must_use]
pub fn builtin() -> Catalog {
    Catalog::new(products(), translations())
}

fn products() -> Vec<Product> {
    vec![
        Product::new(
            "p1",
            "Aros Siena",
            "Argollas martilladas con terminación satinada, livianas para uso diario.",
            "aros",
            "enchapado-oro",
            "Aurelia",
            18_900,
            40,
            "Pack 6 pares",
        )
        .with_variant("gold", "Dorado", 25)
        .with_variant("silver", "Plateado", 15),
        Product::new(
            "p2",
            "Pulsera Lira",
            "Pulsera de eslabones finos con cierre mosquetón.",
            "pulseras",
            "acero-quirurgico",
            "Luma",
            13_200,
            60,
            "Pack 12 unidades",
        )
        .with_original_price(16_500),
        Product::new(
            "p3",
            "Anillo Vega",
            "Anillo de banda delgada con circón central.",
            "anillos",
            "plata-925",
            "Nácar",
            15_500,
            0,
            "Pack 6 unidades",
        )
        .with_variant("s6", "Talla 6", 0)
        .with_variant("s7", "Talla 7", 4),
        Product::new(
            "p4",
            "Collar Alba",
            "Cadena tipo rolo con dije de luna.",
            "collares",
            "acero-quirurgico",
            "Luma",
            9_900,
            80,
            "Pack 12 unidades",
        ),
        Product::new(
            "p5",
            "Aros Perla Marina",
            "Aros de perla cultivada sobre base de plata.",
            "aros",
            "plata-925",
            "Nácar",
            20_000,
            30,
            "Pack 6 pares",
        )
        .with_original_price(24_000),
        Product::new(
            "p6",
            "Collar Toscana",
            "Cadena fina con dije inspirado en los tonos terracota de Siena.",
            "collares",
            "enchapado-oro",
            "Aurelia",
            24_900,
            25,
            "Pack 6 unidades",
        ),
        Product::new(
            "p7",
            "Pulsera Aurora",
            "Brazalete rígido con grabado floral.",
            "pulseras",
            "plata-925",
            "Aurelia",
            27_500,
            18,
            "Pack 6 unidades",
        )
        .with_variant("gold", "Dorado", 10)
        .with_variant("silver", "Plateado", 8),
        Product::new(
            "p8",
            "Anillo Duna",
            "Anillo ondulado de superficie pulida.",
            "anillos",
            "enchapado-oro",
            "Luma",
            30_000,
            22,
            "Pack 12 unidades",
        )
        .with_original_price(34_000),
        Product::new(
            "p9",
            "Aros Bruma",
            "Aros colgantes con cristales ahumados.",
            "aros",
            "acero-quirurgico",
            "Nácar",
            22_000,
            35,
            "Pack 6 pares",
        ),
        Product::new(
            "p10",
            "Set Imperial",
            "Conjunto de collar, aros y pulsera en estuche de regalo.",
            "sets",
            "plata-925",
            "Aurelia",
            98_500,
            5,
            "Pack 3 sets",
        ),
    ]
}

fn translations() -> Translations {
    let mut t = Translations::new();

    for (id, name) in [
        ("p1", "시에나 귀걸이"),
        ("p2", "리라 팔찌"),
        ("p3", "베가 반지"),
        ("p4", "알바 목걸이"),
        ("p5", "마리나 진주 귀걸이"),
        ("p6", "토스카나 목걸이"),
        ("p7", "오로라 팔찌"),
        ("p8", "두나 반지"),
        ("p9", "브루마 귀걸이"),
        ("p10", "임페리얼 세트"),
    ] {
        t.insert_name(Language::Ko, id, name);
    }

    for (id, description) in [
        ("p1", "새틴 마감의 해머드 링 귀걸이, 데일리용으로 가볍습니다."),
        ("p5", "실버 베이스 위 담수 진주 귀걸이."),
        ("p6", "시에나의 테라코타 색감에서 영감을 받은 펜던트 체인."),
        ("p10", "목걸이, 귀걸이, 팔찌로 구성된 선물 상자 세트."),
    ] {
        t.insert_description(Language::Ko, id, description);
    }

    for (raw, label) in [
        ("Dorado", "골드"),
        ("Plateado", "실버"),
        ("Talla 6", "6호"),
        ("Talla 7", "7호"),
        ("Pack 6 pares", "6쌍 팩"),
        ("Pack 6 unidades", "6개 팩"),
        ("Pack 12 unidades", "12개 팩"),
        ("Pack 3 sets", "3세트 팩"),
        ("aros", "귀걸이"),
        ("collares", "목걸이"),
        ("pulseras", "팔찌"),
        ("anillos", "반지"),
        ("sets", "세트"),
        ("plata-925", "925 실버"),
        ("enchapado-oro", "금도금"),
        ("acero-quirurgico", "써지컬 스틸"),
    ] {
        t.insert_label(Language::Ko, raw, label);
    }

    t
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aurelia_core::ProductId;

    use super::*;

    #[test]
    fn test_builtin_has_ten_products() {
        let catalog = builtin();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.all().first().unwrap().id.as_str(), "p1");
    }

    #[test]
    fn test_builtin_discounts_hold_invariant() {
        let catalog = builtin();
        for product in catalog.all() {
            if let Some(original) = product.original_price {
                assert!(original > product.price, "{}", product.id);
            }
        }
    }

    #[test]
    fn test_builtin_korean_names() {
        let catalog = builtin();
        assert_eq!(
            catalog.name_for(&ProductId::new("p1"), Language::Ko),
            Some("시에나 귀걸이")
        );
        // p2 has no Korean description, so the Spanish one is used.
        assert_eq!(
            catalog.description_for(&ProductId::new("p2"), Language::Ko),
            Some("Pulsera de eslabones finos con cierre mosquetón.")
        );
    }

    #[test]
    fn test_builtin_facets() {
        let catalog = builtin();
        assert_eq!(
            catalog.subcategories(),
            vec!["aros", "pulseras", "anillos", "collares", "sets"]
        );
        assert_eq!(catalog.brands(), vec!["Aurelia", "Luma", "Nácar"]);
        assert_eq!(
            catalog.categories(),
            vec!["enchapado-oro", "acero-quirurgico", "plata-925"]
        );
    }
}
