use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Foods,
    Knowledge,
    Sights,
    Thinking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: u32,
    pub title: &'static str,
    pub image: &'static str,
    pub desc: &'static str,
}

impl CatalogItem {
    /// Text of the transient notice shown when the item is tapped.
    pub fn tap_message(&self) -> String {
        format!("{}: {}", self.title, self.desc)
    }
}

impl Category {
    pub fn title(self) -> &'static str {
        match self {
            Category::Foods => "Foods",
            Category::Knowledge => "Knowledge",
            Category::Sights => "Sights",
            Category::Thinking => "Thinking",
        }
    }

    pub fn items(self) -> &'static [CatalogItem] {
        match self {
            Category::Foods => FOODS,
            Category::Knowledge => KNOWLEDGE,
            Category::Sights => SIGHTS,
            Category::Thinking => THINKING,
        }
    }

    pub fn item(self, index: usize) -> Option<&'static CatalogItem> {
        self.items().get(index)
    }
}

const FOODS: &[CatalogItem] = &[
    CatalogItem {
        id: 1,
        title: "Hot Pot",
        image: "/images/foods/hotpot.png",
        desc: "A simmering pot shared around the table",
    },
    CatalogItem {
        id: 2,
        title: "Dumplings",
        image: "/images/foods/dumplings.png",
        desc: "Folded by hand, boiled or pan-fried",
    },
    CatalogItem {
        id: 3,
        title: "Mooncakes",
        image: "/images/foods/mooncake.png",
        desc: "Dense pastries for the mid-autumn moon",
    },
    CatalogItem {
        id: 4,
        title: "Hand-pulled Noodles",
        image: "/images/foods/noodles.png",
        desc: "Stretched and folded until thread-thin",
    },
];

const KNOWLEDGE: &[CatalogItem] = &[
    CatalogItem {
        id: 1,
        title: "REM Sleep",
        image: "/images/knowledge/rem.png",
        desc: "The sleep stage where vivid dreams happen",
    },
    CatalogItem {
        id: 2,
        title: "Lucid Dreaming",
        image: "/images/knowledge/lucid.png",
        desc: "Knowing you are dreaming while you dream",
    },
    CatalogItem {
        id: 3,
        title: "Dream Recall",
        image: "/images/knowledge/recall.png",
        desc: "Write dreams down right after waking",
    },
    CatalogItem {
        id: 4,
        title: "Sleep Cycles",
        image: "/images/knowledge/cycles.png",
        desc: "Roughly ninety minutes from light to deep and back",
    },
];

const SIGHTS: &[CatalogItem] = &[
    CatalogItem {
        id: 1,
        title: "Aurora",
        image: "/images/sights/aurora.png",
        desc: "Curtains of light over polar skies",
    },
    CatalogItem {
        id: 2,
        title: "Salt Flats",
        image: "/images/sights/salt-flats.png",
        desc: "A mirror of sky after the rain",
    },
    CatalogItem {
        id: 3,
        title: "Karst Peaks",
        image: "/images/sights/karst.png",
        desc: "Limestone towers rising from the river mist",
    },
    CatalogItem {
        id: 4,
        title: "Bioluminescent Bay",
        image: "/images/sights/bay.png",
        desc: "Waves that glow blue when touched",
    },
];

const THINKING: &[CatalogItem] = &[
    CatalogItem {
        id: 1,
        title: "Butterfly Dream",
        image: "/images/thinking/butterfly.png",
        desc: "Am I dreaming the butterfly, or is it dreaming me?",
    },
    CatalogItem {
        id: 2,
        title: "Ship of Theseus",
        image: "/images/thinking/theseus.png",
        desc: "Replace every plank: is it the same ship?",
    },
    CatalogItem {
        id: 3,
        title: "Allegory of the Cave",
        image: "/images/thinking/cave.png",
        desc: "Shadows on the wall mistaken for the world",
    },
    CatalogItem {
        id: 4,
        title: "Occam's Razor",
        image: "/images/thinking/razor.png",
        desc: "Prefer the explanation with fewer assumptions",
    },
];
