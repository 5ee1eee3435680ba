//! Static case content the core is parameterized by.
//!
//! Rooms, item definitions, and the fragment-to-evidence mapping are
//! data, not logic: the core validates against whatever `ContentPack`
//! it was constructed with. Packs can be deserialized from external
//! JSON, or the shipped case can be used via `ContentPack::builtin()`.

use crate::{
    state::{Item, ItemCategory},
    types::{EvidenceId, FragmentId, ItemId, Millis, RoomId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDef {
    pub id:   RoomId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id:          ItemId,
    pub name:        String,
    pub icon:        String,
    pub description: String,
    pub category:    ItemCategory,
}

impl ItemDef {
    /// Instantiate this definition as an owned inventory item.
    pub fn to_item(&self, obtained_at: Millis) -> Item {
        Item {
            id:          self.id.clone(),
            name:        self.name.clone(),
            icon:        self.icon.clone(),
            description: self.description.clone(),
            category:    self.category,
            obtained_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentDef {
    pub id:               FragmentId,
    pub name:             String,
    pub icon:             String,
    pub description:      String,
    pub trigger_evidence: EvidenceId,
    pub position:         GridPos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPack {
    pub rooms:     Vec<RoomDef>,
    pub items:     Vec<ItemDef>,
    pub fragments: Vec<FragmentDef>,
}

impl ContentPack {
    pub fn room(&self, id: &str) -> Option<&RoomDef> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn fragment(&self, id: &str) -> Option<&FragmentDef> {
        self.fragments.iter().find(|f| f.id == id)
    }

    /// Display name for a room, falling back to the raw id for rooms
    /// the pack does not know about.
    pub fn room_name(&self, id: &str) -> String {
        self.room(id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// The shipped case: seven rooms of an apartment crime scene,
    /// three ordinary evidence items plus one hidden item, and a full
    /// 3x3 memory-fragment set keyed to the evidence ids.
    pub fn builtin() -> Self {
        let rooms = [
            ("entrance", "Entrance Hall"),
            ("living-room", "Living Room"),
            ("kitchen", "Kitchen"),
            ("study", "Study"),
            ("bedroom", "Bedroom"),
            ("balcony", "Balcony"),
            ("bathroom", "Bathroom"),
        ]
        .into_iter()
        .map(|(id, name)| RoomDef {
            id:   id.to_string(),
            name: name.to_string(),
        })
        .collect();

        let items = vec![
            ItemDef {
                id:          "bloodknife".into(),
                name:        "Bloodstained Knife".into(),
                icon:        "🔪".into(),
                description: "A kitchen knife crusted with dried blood. The stains are \
                              old but unmistakable."
                    .into(),
                category:    ItemCategory::Evidence,
            },
            ItemDef {
                id:          "insurance".into(),
                name:        "Insurance Policy".into(),
                icon:        "📄".into(),
                description: "A life insurance policy. The beneficiary line names a \
                              stranger, and the payout is considerable."
                    .into(),
                category:    ItemCategory::Document,
            },
            ItemDef {
                id:          "tornletter".into(),
                name:        "Torn Letter".into(),
                icon:        "📝".into(),
                description: "Shredded fragments of a letter. The legible scraps read \
                              like a warning."
                    .into(),
                category:    ItemCategory::Evidence,
            },
            ItemDef {
                id:          "hypnosis_receipt".into(),
                name:        "Clinic Receipt".into(),
                icon:        "🧾".into(),
                description: "A receipt from a hypnotherapy clinic, dated the night of \
                              the murder. Somebody wanted memories rewritten."
                    .into(),
                category:    ItemCategory::HiddenEvidence,
            },
        ];

        // Nine fragments, one per grid cell, in registration order.
        // Triggers reuse the case's evidence ids; later cells hang off
        // scene evidence discovered while searching rooms.
        let triggers = [
            "bloodknife",
            "tornletter",
            "insurance",
            "sofa_stain",
            "desk_drawer",
            "wardrobe_scratch",
            "balcony_rail",
            "mirror_writing",
            "hypnosis_receipt",
        ];
        let fragments = triggers
            .into_iter()
            .enumerate()
            .map(|(i, trigger)| FragmentDef {
                id:               format!("witness_{}", i + 1),
                name:             format!("Witness Fragment {}", i + 1),
                icon:             "🧩".into(),
                description:      "A blurred sliver of the night coming back.".into(),
                trigger_evidence: trigger.to_string(),
                position:         GridPos {
                    x: (i % 3) as u8,
                    y: (i / 3) as u8,
                },
            })
            .collect();

        Self {
            rooms,
            items,
            fragments,
        }
    }
}
