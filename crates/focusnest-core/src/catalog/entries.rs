use super::{AffinityTag, CatalogEntry, Rarity};

fn bird(
    id: &str,
    name: &str,
    species: &str,
    rarity: Rarity,
    affinity: AffinityTag,
    description: &str,
    habitat: &str,
) -> CatalogEntry {
    CatalogEntry {
        id: id.into(),
        name: name.into(),
        species: species.into(),
        rarity,
        affinity,
        description: description.into(),
        habitat: habitat.into(),
    }
}

pub(super) fn builtin_entries() -> Vec<CatalogEntry> {
    use AffinityTag::{Biscuit, Fruit, Seed};
    use Rarity::{Common, Legendary, Rare, Uncommon};

    vec![
        // Seed
        bird(
            "bem-te-vi",
            "Bem-te-vi",
            "Pitangus sulphuratus",
            Common,
            Seed,
            "The most recognizable bird in Brazil, famous for its distinctive call.",
            "Fields and gardens",
        ),
        bird(
            "pintassilgo",
            "Pintassilgo",
            "Spinus magellanicus",
            Uncommon,
            Seed,
            "A small, colorful bird with a melodious song.",
            "Forest edges",
        ),
        bird(
            "beija-flor",
            "Beija-flor",
            "Trochilidae",
            Rare,
            Seed,
            "Tiny and incredibly fast, a symbol of lightness and joy.",
            "Forests and flower gardens",
        ),
        bird(
            "uirapuru",
            "Uirapuru",
            "Cyphorhinus arada",
            Legendary,
            Seed,
            "The legendary bird whose song is said to bring luck and love to those who hear it.",
            "Amazon Rainforest",
        ),
        // Fruit
        bird(
            "sabia",
            "Sabiá-laranjeira",
            "Turdus rufiventris",
            Common,
            Fruit,
            "Brazil's national bird, its song announces the morning in cities.",
            "Woods and urban gardens",
        ),
        bird(
            "tucano",
            "Tucano",
            "Ramphastos toco",
            Uncommon,
            Fruit,
            "Icon of the Atlantic Forest, with its enormous colorful bill.",
            "Atlantic Forest",
        ),
        bird(
            "arara-azul",
            "Arara-azul",
            "Anodorhynchus hyacinthinus",
            Rare,
            Fruit,
            "The largest macaw in the world, in a stunning blue, threatened with extinction.",
            "Pantanal and Cerrado",
        ),
        bird(
            "harpia",
            "Harpia",
            "Harpia harpyja",
            Legendary,
            Fruit,
            "The most powerful eagle of the Americas, a symbol of strength and majesty.",
            "Amazon Rainforest",
        ),
        // Biscuit
        bird(
            "periquito",
            "Periquito",
            "Brotogeris chiriri",
            Common,
            Biscuit,
            "Small and lively, lives in noisy flocks in cities.",
            "Urban areas and cerrado",
        ),
        bird(
            "papagaio",
            "Papagaio-verdadeiro",
            "Amazona amazonica",
            Uncommon,
            Biscuit,
            "Famous for its ability to mimic sounds and human voices.",
            "Tropical forests",
        ),
        bird(
            "cacatua",
            "Cacatua",
            "Cacatua galerita",
            Rare,
            Biscuit,
            "An exotic bird with an impressive crest, extremely intelligent.",
            "Tropical regions",
        ),
        bird(
            "ararinha-azul",
            "Ararinha-azul",
            "Cyanopsitta spixii",
            Legendary,
            Biscuit,
            "Extinct in the wild and a symbol of Brazilian conservation. Finding one is a miracle.",
            "Caatinga (extinct in the wild)",
        ),
    ]
}
