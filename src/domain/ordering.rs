use uuid::Uuid;

text_enum! {
    pub enum MoveDirection {
        Up => "up",
        Down => "down",
    }
}

/// Display order writes needed to move `id` one place in `entries`, which must already be
/// sorted by display order. Returns an empty list when the entry is unknown or already at the
/// edge.
///
/// Two entries sharing a display order cannot be swapped meaningfully, so in that case every
/// entry is renumbered `1..=n` in its new position.
pub fn plan_move(entries: &[(Uuid, i32)], id: Uuid, direction: MoveDirection) -> Vec<(Uuid, i32)> {
    let Some(index) = entries.iter().position(|(entry, _)| *entry == id) else {
        return Vec::new();
    };
    let neighbour = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => Some(index + 1).filter(|&i| i < entries.len()),
    };
    let Some(neighbour) = neighbour else {
        return Vec::new();
    };

    let (current_id, current_order) = entries[index];
    let (neighbour_id, neighbour_order) = entries[neighbour];
    if current_order != neighbour_order {
        return vec![(current_id, neighbour_order), (neighbour_id, current_order)];
    }

    let mut ids: Vec<Uuid> = entries.iter().map(|(entry, _)| *entry).collect();
    ids.swap(index, neighbour);
    ids.into_iter()
        .zip(1..)
        .filter(|(entry, position)| {
            entries
                .iter()
                .any(|(other, order)| other == entry && order != position)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn swaps_with_neighbour() {
        let ids = ids(3);
        let entries = vec![(ids[0], 1), (ids[1], 2), (ids[2], 5)];

        assert_eq!(
            plan_move(&entries, ids[2], MoveDirection::Up),
            vec![(ids[2], 2), (ids[1], 5)]
        );
        assert_eq!(
            plan_move(&entries, ids[0], MoveDirection::Down),
            vec![(ids[0], 2), (ids[1], 1)]
        );
    }

    #[test]
    fn edges_are_no_ops() {
        let ids = ids(2);
        let entries = vec![(ids[0], 1), (ids[1], 2)];

        assert!(plan_move(&entries, ids[0], MoveDirection::Up).is_empty());
        assert!(plan_move(&entries, ids[1], MoveDirection::Down).is_empty());
        assert!(plan_move(&entries, Uuid::new_v4(), MoveDirection::Up).is_empty());
    }

    #[test]
    fn ties_renumber_the_whole_list() {
        let ids = ids(3);
        let entries = vec![(ids[0], 0), (ids[1], 0), (ids[2], 0)];

        let writes = plan_move(&entries, ids[2], MoveDirection::Up);
        assert_eq!(writes, vec![(ids[0], 1), (ids[2], 2), (ids[1], 3)]);
    }
}
