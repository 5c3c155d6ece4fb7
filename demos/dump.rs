use avl_dict::AvlTree;

fn main() {
    let mut tree = AvlTree::new();
    for key in [10, 5, 15, 3, 7, 12, 20] {
        tree.insert(key, key.to_string()).unwrap();
    }

    println!("Tree:");
    print!("{tree}");

    let (node, edges) = tree.finger_search(&12);
    println!("Finger search for 12: {:?} after {edges} nodes", node.map(|n| n.value()));

    let Some(handle) = tree.search(&7).0.map(|node| node.handle()) else {
        return;
    };
    let Ok(mut split) = tree.split(&handle) else {
        return;
    };
    println!("Below 7:");
    print!("{}", split.left);
    println!("Above 7:");
    print!("{}", split.right);

    let (key, value) = split.pivot;
    if split.left.join(split.right, key, value).is_ok() {
        println!("Joined again:");
        print!("{}", split.left);
    }
}
